//! Foreign-table index: reverse map over the schema's foreign keys.
//!
//! For each table in the live schema the index answers "which tables
//! hold a foreign key pointing at it" - exactly the tables that must be
//! dropped before it. Built once per migration-unit lifetime from a
//! single catalog scan; subsequent lookups are pure map reads.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::driver::SchemaDriver;
use crate::error::Result;

/// Mapping from a referenced table to the set of tables referencing it.
///
/// The index reflects the schema's *actual* foreign keys as reported by
/// the driver, not the set of table units a migration declares, so a
/// cascade drop correctly reaches tables outside the current migration
/// unit.
///
/// Referencer sets are `BTreeSet`s, giving a deterministic sibling order
/// during cascade drops.
#[derive(Debug, Clone, Default)]
pub struct ForeignTableIndex {
    map: HashMap<String, BTreeSet<String>>,
}

impl ForeignTableIndex {
    /// Build the index from the driver's live catalog.
    ///
    /// Every table present in the schema gets an entry, even when
    /// nothing references it. Self-referencing foreign keys are skipped:
    /// a table is never listed as its own referencer.
    pub fn build(driver: &mut dyn SchemaDriver) -> Result<Self> {
        let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();

        for table in driver.table_names()? {
            map.entry(table).or_default();
        }

        let edges = driver.all_foreign_keys()?;
        debug!("Indexing {} foreign-key edges", edges.len());

        for edge in edges {
            if edge.is_self_referencing() {
                continue;
            }
            map.entry(edge.ref_table).or_default().insert(edge.table);
        }

        Ok(Self { map })
    }

    /// Tables holding a foreign key into `table`.
    ///
    /// Returns `None` when the table is absent from the live schema and
    /// `Some` of an empty set when it exists but nothing references it.
    /// Callers use the distinction to decide whether a physical drop is
    /// warranted at all.
    pub fn referencers(&self, table: &str) -> Option<&BTreeSet<String>> {
        self.map.get(table)
    }

    /// Whether the table exists in the indexed schema snapshot.
    pub fn contains(&self, table: &str) -> bool {
        self.map.contains_key(table)
    }

    /// Number of tables in the snapshot.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
