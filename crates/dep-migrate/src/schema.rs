//! Schema metadata types shared between the migration engine and drivers.
//!
//! These types provide a database-agnostic description of the pieces of
//! schema the engine cares about: column definitions handed to
//! [`SchemaDriver::create_table`](crate::driver::SchemaDriver::create_table)
//! and foreign-key edges read back from the live catalog.

use serde::{Deserialize, Serialize};

/// Column definition passed to a driver's `create_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,

    /// Data type as a SQL type string (e.g. "bigint", "varchar(255)").
    pub data_type: String,

    /// Whether the column allows NULL.
    pub is_nullable: bool,

    /// Default value expression, rendered verbatim by the driver.
    pub default_expr: Option<String>,
}

impl ColumnDef {
    /// Create a nullable column with no default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            default_expr: None,
        }
    }

    /// Mark the column NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Set a default value expression.
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default_expr = Some(expr.into());
        self
    }
}

/// A directed foreign-key relationship read from the live catalog.
///
/// The edge points from the table holding the constraint to the table it
/// references. Snapshotted once per migration-unit lifetime when the
/// foreign-table index is built; the core never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyEdge {
    /// Table holding the foreign key (referencing side).
    pub table: String,

    /// Table the foreign key points at (referenced side).
    pub ref_table: String,
}

impl ForeignKeyEdge {
    /// Create an edge from `table` to `ref_table`.
    pub fn new(table: impl Into<String>, ref_table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ref_table: ref_table.into(),
        }
    }

    /// Whether the constraint references its own table.
    pub fn is_self_referencing(&self) -> bool {
        self.table == self.ref_table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_def_builders() {
        let col = ColumnDef::new("id", "bigint").not_null();
        assert_eq!(col.name, "id");
        assert_eq!(col.data_type, "bigint");
        assert!(!col.is_nullable);
        assert!(col.default_expr.is_none());

        let col = ColumnDef::new("status", "text").default_expr("'active'");
        assert!(col.is_nullable);
        assert_eq!(col.default_expr.as_deref(), Some("'active'"));
    }

    #[test]
    fn test_self_referencing_edge() {
        assert!(ForeignKeyEdge::new("category", "category").is_self_referencing());
        assert!(!ForeignKeyEdge::new("post", "user").is_self_referencing());
    }
}
