//! Migration engine: dependency resolution and cascading teardown.
//!
//! A [`Migration`] owns a registry of [`TableUnit`]s (one builder per
//! table, registered at construction), a [`SchemaDriver`], and the
//! per-pass bookkeeping sets. `up()` installs every declared table in
//! dependency order; `down()` drops them in reverse dependency order by
//! consulting the foreign-table index built from the live catalog.
//!
//! Everything is synchronous, single-threaded plain call-stack
//! recursion. Recursion depth is bounded by the depth of the
//! foreign-key dependency chain.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::MigrationOptions;
use crate::driver::SchemaDriver;
use crate::error::{MigrateError, Result};
use crate::index::ForeignTableIndex;
use crate::naming;
use crate::schema::ColumnDef;

/// Lifecycle phase of a migration unit.
///
/// Valid transitions: `NotStarted -> Upping -> Upped` and
/// `NotStarted | Upped -> Downing -> Downed`. Each migration-unit
/// instance executes its lifecycle at most once, then is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Neither pass has run.
    #[default]
    NotStarted,
    /// An apply pass is in progress.
    Upping,
    /// The apply pass completed.
    Upped,
    /// A revert pass is in progress.
    Downing,
    /// The revert pass completed.
    Downed,
}

type BuildFn<D> = Arc<dyn Fn(&mut Migration<D>) -> Result<()>>;

/// One named table-builder procedure within a migration unit.
///
/// The build closure emits the table's creation statements through the
/// [`Migration`] it receives, and may declare foreign keys to other
/// units by name via [`Migration::add_foreign_key`]. It is invoked at
/// most once per apply pass.
pub struct TableUnit<D: SchemaDriver> {
    name: String,
    build: BuildFn<D>,
}

impl<D: SchemaDriver> TableUnit<D> {
    /// Register a builder under a table name.
    pub fn new(
        name: impl Into<String>,
        build: impl Fn(&mut Migration<D>) -> Result<()> + 'static,
    ) -> Self
    where
        D: 'static,
    {
        Self {
            name: name.into(),
            build: Arc::new(build),
        }
    }

    /// The table name this unit creates.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<D: SchemaDriver> Clone for TableUnit<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<D: SchemaDriver> std::fmt::Debug for TableUnit<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableUnit").field("name", &self.name).finish()
    }
}

/// Result of an apply or revert pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Pass direction: "up" or "down".
    pub direction: String,

    /// When the pass started.
    pub started_at: DateTime<Utc>,

    /// When the pass completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Number of declared table units.
    pub tables_declared: usize,

    /// Tables physically built or dropped during the pass.
    pub tables_processed: usize,

    /// Build or drop order, as executed.
    pub table_order: Vec<String>,
}

impl MigrationReport {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A migration unit: table-unit registry plus per-pass state.
///
/// Owns its installed/deleted sets and cached foreign-table index
/// exclusively; nothing is shared across instances and nothing is
/// persisted.
pub struct Migration<D: SchemaDriver> {
    driver: D,
    options: MigrationOptions,
    units: Vec<TableUnit<D>>,
    by_name: HashMap<String, usize>,
    installed: HashSet<String>,
    deleted: HashSet<String>,
    foreign_tables: Option<ForeignTableIndex>,
    phase: Phase,
    build_order: Vec<String>,
    drop_order: Vec<String>,
}

impl<D: SchemaDriver> Migration<D> {
    /// Create a migration unit over a driver and a declared unit list.
    ///
    /// The declared order is the order `up()` requests installs and
    /// `down()` requests drops; dependency resolution reorders the
    /// actual DDL as needed.
    ///
    /// # Errors
    ///
    /// Returns `MigrateError::Config` for duplicate or invalid unit
    /// names.
    pub fn new(driver: D, units: Vec<TableUnit<D>>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(units.len());
        for (idx, unit) in units.iter().enumerate() {
            naming::validate_identifier(&unit.name)?;
            if by_name.insert(unit.name.clone(), idx).is_some() {
                return Err(MigrateError::Config(format!(
                    "Duplicate table unit: '{}'",
                    unit.name
                )));
            }
        }

        Ok(Self {
            driver,
            options: MigrationOptions::default(),
            units,
            by_name,
            installed: HashSet::new(),
            deleted: HashSet::new(),
            foreign_tables: None,
            phase: Phase::NotStarted,
            build_order: Vec::new(),
            drop_order: Vec::new(),
        })
    }

    /// Apply validated options.
    pub fn with_options(mut self, options: MigrationOptions) -> Result<Self> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Borrow the underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Consume the migration, returning the driver.
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Whether a table was built during the current apply pass.
    pub fn is_installed(&self, table: &str) -> bool {
        self.installed.contains(table)
    }

    /// Whether a table was handled during the current revert pass.
    pub fn is_deleted(&self, table: &str) -> bool {
        self.deleted.contains(table)
    }

    /// Builds completed so far, in completion order.
    pub fn build_order(&self) -> &[String] {
        &self.build_order
    }

    /// Physical drops issued so far, in execution order.
    pub fn drop_order(&self) -> &[String] {
        &self.drop_order
    }

    // ===== Lifecycle =====

    /// Run the apply pass: install every declared table unit.
    pub fn up(&mut self) -> Result<MigrationReport> {
        self.transition(Phase::Upping)?;
        let started_at = Utc::now();
        info!("Apply pass: {} declared table units", self.units.len());

        let names: Vec<String> = self.units.iter().map(|u| u.name.clone()).collect();
        self.install(&names)?;

        self.phase = Phase::Upped;
        let report = self.report("up", started_at, self.build_order.clone());
        info!(
            "Apply pass complete: {} tables built in {:.3}s",
            report.tables_processed, report.duration_seconds
        );
        Ok(report)
    }

    /// Run the revert pass: drop every declared table not yet deleted,
    /// cascading through live referencers first.
    pub fn down(&mut self) -> Result<MigrationReport> {
        self.transition(Phase::Downing)?;
        let started_at = Utc::now();
        info!("Revert pass: {} declared table units", self.units.len());

        let names: Vec<String> = self.units.iter().map(|u| u.name.clone()).collect();
        for name in &names {
            if !self.deleted.contains(name) {
                self.drop_table(name)?;
            }
        }

        self.phase = Phase::Downed;
        let report = self.report("down", started_at, self.drop_order.clone());
        info!(
            "Revert pass complete: {} tables dropped in {:.3}s",
            report.tables_processed, report.duration_seconds
        );
        Ok(report)
    }

    fn transition(&mut self, to: Phase) -> Result<()> {
        let allowed = match to {
            Phase::Upping => self.phase == Phase::NotStarted,
            Phase::Downing => matches!(self.phase, Phase::NotStarted | Phase::Upped),
            _ => false,
        };
        if !allowed {
            return Err(MigrateError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    fn report(&self, direction: &str, started_at: DateTime<Utc>, order: Vec<String>) -> MigrationReport {
        let completed_at = Utc::now();
        MigrationReport {
            run_id: Uuid::new_v4().to_string(),
            direction: direction.to_string(),
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            tables_declared: self.units.len(),
            tables_processed: order.len(),
            table_order: order,
        }
    }

    // ===== Dependency resolver =====

    /// Install the named tables, resolving foreign-key dependencies
    /// on demand.
    ///
    /// Each table is marked installed *before* its builder runs; the
    /// pre-marking turns recursive self-reference and circular foreign
    /// keys into no-ops instead of infinite recursion. With a true
    /// cycle, one side's builder runs while its dependency is merely
    /// claimed - an accepted limitation.
    ///
    /// # Errors
    ///
    /// `MigrateError::UnknownTable` if a name has no registered unit;
    /// the pass aborts and the set stays unchanged for that name.
    /// Builder and driver errors propagate unchanged.
    pub fn install<I, S>(&mut self, tables: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for table in tables {
            let name = table.as_ref();
            if self.installed.contains(name) {
                continue;
            }

            let unit = match self.by_name.get(name) {
                Some(&idx) => self.units[idx].clone(),
                None => return Err(MigrateError::UnknownTable(name.to_string())),
            };

            self.installed.insert(name.to_string());
            debug!("Building table: {}", name);
            (unit.build)(self)?;
            self.build_order.push(name.to_string());
        }
        Ok(())
    }

    // ===== Cascade dropper =====

    /// Drop a table, first dropping every live table that references it.
    ///
    /// Tables absent from the live schema are treated as having no
    /// dependents: the drop degrades to marking the name deleted, so
    /// repeated or partial teardown stays safe.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        if self.deleted.contains(table) {
            return Ok(());
        }

        self.ensure_foreign_index()?;
        let referencers: Option<Vec<String>> = self
            .foreign_tables
            .as_ref()
            .and_then(|index| index.referencers(table))
            .map(|set| set.iter().cloned().collect());

        match referencers {
            Some(dependents) => {
                for dependent in dependents {
                    self.drop_table(&dependent)?;
                }
                debug!("Dropping table: {}", table);
                self.driver.drop_table(table)?;
                self.drop_order.push(table.to_string());
            }
            None => {
                debug!("Table {} absent from schema, skipping physical drop", table);
            }
        }

        self.deleted.insert(table.to_string());
        Ok(())
    }

    /// Tables holding a foreign key into `table`, per the cached index.
    ///
    /// `None` means the table is absent from the live schema; an empty
    /// set means it exists with no dependents.
    pub fn foreign_referencers(&mut self, table: &str) -> Result<Option<&BTreeSet<String>>> {
        self.ensure_foreign_index()?;
        Ok(self
            .foreign_tables
            .as_ref()
            .and_then(|index| index.referencers(table)))
    }

    fn ensure_foreign_index(&mut self) -> Result<()> {
        if self.foreign_tables.is_none() {
            let index = ForeignTableIndex::build(&mut self.driver)?;
            debug!("Foreign-table index covers {} live tables", index.len());
            self.foreign_tables = Some(index);
        }
        Ok(())
    }

    // ===== DDL pass-throughs =====

    /// Create a table.
    ///
    /// Falls back to the configured default table options when the
    /// builder passes none.
    pub fn create_table(
        &mut self,
        table: &str,
        columns: &[ColumnDef],
        options: Option<&str>,
    ) -> Result<()> {
        info!("Creating table: {}", table);
        let defaults = self.options.table_options.clone();
        self.driver
            .create_table(table, columns, options.or(defaults.as_deref()))
    }

    /// Add a foreign key with a convention-derived constraint name.
    ///
    /// Installs the referenced table first, reentering the resolver;
    /// an already-installed referenced table is a silent no-op.
    pub fn add_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        ref_table: &str,
        ref_columns: &[String],
        on_delete: Option<&str>,
        on_update: Option<&str>,
    ) -> Result<()> {
        self.install([ref_table])?;
        let name = naming::foreign_key_name(table, columns);
        debug!("Adding foreign key {}: {} -> {}", name, table, ref_table);
        self.driver.add_foreign_key(
            &name, table, columns, ref_table, ref_columns, on_delete, on_update,
        )
    }

    /// Add a primary key with a convention-derived constraint name.
    pub fn add_primary_key(&mut self, table: &str, columns: &[String]) -> Result<()> {
        let name = naming::primary_key_name(table);
        debug!("Adding primary key {} on {}", name, table);
        self.driver.add_primary_key(&name, table, columns)
    }

    /// Create an index with a convention-derived name.
    pub fn create_index(&mut self, table: &str, columns: &[String], unique: bool) -> Result<()> {
        let name = naming::index_name(table, columns);
        debug!("Creating index {} on {}", name, table);
        self.driver.create_index(&name, table, columns, unique)
    }

    /// Insert multiple rows in one statement.
    pub fn batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        self.driver.batch_insert(table, columns, rows)
    }

    /// Reset the sequence backing an identity column.
    pub fn reset_sequence(&mut self, table: &str, column: &str) -> Result<()> {
        self.driver.reset_sequence(table, column)
    }
}
