//! In-memory schema driver.
//!
//! Keeps a live catalog of tables and foreign keys plus an ordered log
//! of every DDL call, which makes it the natural test double for the
//! migration engine and a cheap dry-run vehicle. Catalog violations
//! (duplicate create, drop of a missing table, foreign key against a
//! missing table) fail the way a real database would.

use std::collections::BTreeMap;

use crate::driver::SchemaDriver;
use crate::error::{MigrateError, Result};
use crate::schema::{ColumnDef, ForeignKeyEdge};

/// One recorded DDL call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlOp {
    CreateTable { table: String },
    DropTable { table: String },
    AddPrimaryKey { name: String, table: String },
    AddForeignKey {
        name: String,
        table: String,
        ref_table: String,
    },
    CreateIndex {
        name: String,
        table: String,
        unique: bool,
    },
    BatchInsert { table: String, rows: u64 },
    ResetSequence { table: String, column: String },
}

#[derive(Debug, Clone, Default)]
struct TableEntry {
    columns: Vec<ColumnDef>,
    options: Option<String>,
}

/// In-memory [`SchemaDriver`] with a DDL call log.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    tables: BTreeMap<String, TableEntry>,
    foreign_keys: Vec<ForeignKeyEdge>,
    log: Vec<DdlOp>,
}

impl MemoryDriver {
    /// Create an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-existing table into the catalog (not logged).
    pub fn with_table(mut self, name: impl Into<String>) -> Self {
        self.tables.insert(name.into(), TableEntry::default());
        self
    }

    /// Seed a pre-existing foreign key into the catalog (not logged).
    pub fn with_foreign_key(
        mut self,
        table: impl Into<String>,
        ref_table: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .push(ForeignKeyEdge::new(table, ref_table));
        self
    }

    /// The ordered DDL call log.
    pub fn log(&self) -> &[DdlOp] {
        &self.log
    }

    /// Whether a table currently exists in the catalog.
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Column definitions of a live table.
    pub fn columns(&self, table: &str) -> Option<&[ColumnDef]> {
        self.tables.get(table).map(|entry| entry.columns.as_slice())
    }

    /// Options clause the table was created with.
    pub fn table_options(&self, table: &str) -> Option<String> {
        self.tables.get(table).and_then(|entry| entry.options.clone())
    }

    fn require_table(&self, table: &str) -> Result<()> {
        if !self.tables.contains_key(table) {
            return Err(MigrateError::driver(table, "table does not exist"));
        }
        Ok(())
    }
}

impl SchemaDriver for MemoryDriver {
    fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn all_foreign_keys(&mut self) -> Result<Vec<ForeignKeyEdge>> {
        Ok(self.foreign_keys.clone())
    }

    fn create_table(
        &mut self,
        table: &str,
        columns: &[ColumnDef],
        options: Option<&str>,
    ) -> Result<()> {
        if self.tables.contains_key(table) {
            return Err(MigrateError::driver(table, "table already exists"));
        }
        self.tables.insert(
            table.to_string(),
            TableEntry {
                columns: columns.to_vec(),
                options: options.map(str::to_string),
            },
        );
        self.log.push(DdlOp::CreateTable {
            table: table.to_string(),
        });
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        if self.tables.remove(table).is_none() {
            return Err(MigrateError::driver(table, "table does not exist"));
        }
        // Constraints vanish with the table on both sides.
        self.foreign_keys
            .retain(|edge| edge.table != table && edge.ref_table != table);
        self.log.push(DdlOp::DropTable {
            table: table.to_string(),
        });
        Ok(())
    }

    fn add_primary_key(&mut self, name: &str, table: &str, _columns: &[String]) -> Result<()> {
        self.require_table(table)?;
        self.log.push(DdlOp::AddPrimaryKey {
            name: name.to_string(),
            table: table.to_string(),
        });
        Ok(())
    }

    fn add_foreign_key(
        &mut self,
        name: &str,
        table: &str,
        _columns: &[String],
        ref_table: &str,
        _ref_columns: &[String],
        _on_delete: Option<&str>,
        _on_update: Option<&str>,
    ) -> Result<()> {
        self.require_table(table)?;
        self.require_table(ref_table)?;
        self.foreign_keys
            .push(ForeignKeyEdge::new(table, ref_table));
        self.log.push(DdlOp::AddForeignKey {
            name: name.to_string(),
            table: table.to_string(),
            ref_table: ref_table.to_string(),
        });
        Ok(())
    }

    fn create_index(
        &mut self,
        name: &str,
        table: &str,
        _columns: &[String],
        unique: bool,
    ) -> Result<()> {
        self.require_table(table)?;
        self.log.push(DdlOp::CreateIndex {
            name: name.to_string(),
            table: table.to_string(),
            unique,
        });
        Ok(())
    }

    fn batch_insert(
        &mut self,
        table: &str,
        _columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        self.require_table(table)?;
        let count = rows.len() as u64;
        self.log.push(DdlOp::BatchInsert {
            table: table.to_string(),
            rows: count,
        });
        Ok(count)
    }

    fn reset_sequence(&mut self, table: &str, column: &str) -> Result<()> {
        self.require_table(table)?;
        self.log.push(DdlOp::ResetSequence {
            table: table.to_string(),
            column: column.to_string(),
        });
        Ok(())
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}
