//! The schema-driver boundary.
//!
//! The migration engine never talks to a database directly. Everything it
//! needs from the outside world goes through [`SchemaDriver`]: a catalog
//! read used once to build the foreign-table index, and pass-through DDL
//! primitives issued strictly in the order the resolver and dropper
//! dictate.
//!
//! Drivers are synchronous and are assumed to serialize all DDL through
//! one connection or transaction context supplied by the caller. The
//! engine issues calls one at a time on a single thread, so drivers need
//! no internal locking on its behalf.

use crate::error::Result;
use crate::schema::{ColumnDef, ForeignKeyEdge};

/// Read/write contract between the migration engine and a database.
///
/// Failures are returned as [`MigrateError`](crate::MigrateError) values
/// and propagate unchanged through the engine; the engine performs no
/// automatic rollback of already-applied steps. That responsibility
/// belongs to the transactional context the caller establishes around
/// the whole pass, if any.
pub trait SchemaDriver {
    // ===== Catalog =====

    /// Names of all tables currently present in the live schema.
    fn table_names(&mut self) -> Result<Vec<String>>;

    /// Every foreign-key relationship in the live schema, as
    /// `referencing -> referenced` edges.
    ///
    /// Called once per migration-unit lifetime to build the
    /// foreign-table index.
    fn all_foreign_keys(&mut self) -> Result<Vec<ForeignKeyEdge>>;

    // ===== DDL =====

    /// Create a table.
    ///
    /// `options` is an engine-specific trailing clause (e.g. a storage
    /// engine or charset specification), rendered verbatim.
    fn create_table(
        &mut self,
        table: &str,
        columns: &[ColumnDef],
        options: Option<&str>,
    ) -> Result<()>;

    /// Drop a table.
    fn drop_table(&mut self, table: &str) -> Result<()>;

    /// Add a primary-key constraint.
    fn add_primary_key(&mut self, name: &str, table: &str, columns: &[String]) -> Result<()>;

    /// Add a foreign-key constraint.
    #[allow(clippy::too_many_arguments)]
    fn add_foreign_key(
        &mut self,
        name: &str,
        table: &str,
        columns: &[String],
        ref_table: &str,
        ref_columns: &[String],
        on_delete: Option<&str>,
        on_update: Option<&str>,
    ) -> Result<()>;

    /// Create an index.
    fn create_index(
        &mut self,
        name: &str,
        table: &str,
        columns: &[String],
        unique: bool,
    ) -> Result<()>;

    // ===== Data / utility =====

    /// Insert multiple rows in one statement. Returns the row count.
    fn batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64>;

    /// Reset the sequence backing an identity column after data load.
    fn reset_sequence(&mut self, table: &str, column: &str) -> Result<()>;

    /// Get the database type identifier (e.g. "memory", "postgres").
    fn db_type(&self) -> &str;
}
