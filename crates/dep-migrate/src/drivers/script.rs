//! Script-generating schema driver.
//!
//! Renders every DDL call as a PostgreSQL statement into an ordered
//! script instead of executing it, so a migration can be reviewed or
//! shipped to a DBA. A virtual catalog mirrors what the script would
//! do to the schema, which keeps revert passes and the foreign-table
//! index working without a live database.

use std::collections::BTreeSet;

use crate::driver::SchemaDriver;
use crate::error::{MigrateError, Result};
use crate::naming::quote_ident;
use crate::schema::{ColumnDef, ForeignKeyEdge};

/// [`SchemaDriver`] that collects PostgreSQL DDL text.
#[derive(Debug, Default)]
pub struct ScriptDriver {
    tables: BTreeSet<String>,
    foreign_keys: Vec<ForeignKeyEdge>,
    statements: Vec<String>,
}

impl ScriptDriver {
    /// Create an empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a pre-existing table into the virtual catalog (no statement
    /// is emitted).
    pub fn with_table(mut self, name: impl Into<String>) -> Self {
        self.tables.insert(name.into());
        self
    }

    /// Seed a pre-existing foreign key into the virtual catalog.
    pub fn with_foreign_key(
        mut self,
        table: impl Into<String>,
        ref_table: impl Into<String>,
    ) -> Self {
        self.foreign_keys
            .push(ForeignKeyEdge::new(table, ref_table));
        self
    }

    /// Statements rendered so far, in execution order.
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// The full script, one statement per line, `;`-terminated.
    pub fn script(&self) -> String {
        let mut out = String::new();
        for statement in &self.statements {
            out.push_str(statement);
            out.push_str(";\n");
        }
        out
    }

    fn render_column(column: &ColumnDef) -> String {
        let mut sql = format!("{} {}", quote_ident(&column.name), column.data_type);
        if !column.is_nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(ref expr) = column.default_expr {
            sql.push_str(&format!(" DEFAULT {}", expr));
        }
        sql
    }

    fn quoted_list(columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn require_table(&self, table: &str) -> Result<()> {
        if !self.tables.contains(table) {
            return Err(MigrateError::driver(table, "table does not exist"));
        }
        Ok(())
    }
}

impl SchemaDriver for ScriptDriver {
    fn table_names(&mut self) -> Result<Vec<String>> {
        Ok(self.tables.iter().cloned().collect())
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
        if !self.tables.insert(table.to_string()) {
            return Err(MigrateError::driver(table, "table already exists"));
        }

        let body = columns
            .iter()
            .map(Self::render_column)
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("CREATE TABLE {} ({})", quote_ident(table), body);
        if let Some(options) = options {
            sql.push(' ');
            sql.push_str(options);
        }
        self.statements.push(sql);
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<()> {
        if !self.tables.remove(table) {
            return Err(MigrateError::driver(table, "table does not exist"));
        }
        self.foreign_keys
            .retain(|edge| edge.table != table && edge.ref_table != table);
        self.statements
            .push(format!("DROP TABLE {}", quote_ident(table)));
        Ok(())
    }

    fn add_primary_key(&mut self, name: &str, table: &str, columns: &[String]) -> Result<()> {
        self.require_table(table)?;
        self.statements.push(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(table),
            quote_ident(name),
            Self::quoted_list(columns)
        ));
        Ok(())
    }

    fn add_foreign_key(
        &mut self,
        name: &str,
        table: &str,
        columns: &[String],
        ref_table: &str,
        ref_columns: &[String],
        on_delete: Option<&str>,
        on_update: Option<&str>,
    ) -> Result<()> {
        self.require_table(table)?;
        self.require_table(ref_table)?;

        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(table),
            quote_ident(name),
            Self::quoted_list(columns),
            quote_ident(ref_table),
            Self::quoted_list(ref_columns)
        );
        if let Some(action) = on_delete {
            sql.push_str(&format!(" ON DELETE {}", action));
        }
        if let Some(action) = on_update {
            sql.push_str(&format!(" ON UPDATE {}", action));
        }

        self.foreign_keys
            .push(ForeignKeyEdge::new(table, ref_table));
        self.statements.push(sql);
        Ok(())
    }

    fn create_index(
        &mut self,
        name: &str,
        table: &str,
        columns: &[String],
        unique: bool,
    ) -> Result<()> {
        self.require_table(table)?;
        let unique_kw = if unique { "UNIQUE " } else { "" };
        self.statements.push(format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique_kw,
            quote_ident(name),
            quote_ident(table),
            Self::quoted_list(columns)
        ));
        Ok(())
    }

    fn batch_insert(
        &mut self,
        table: &str,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<u64> {
        self.require_table(table)?;
        if rows.is_empty() {
            return Ok(0);
        }

        let values = rows
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .map(|cell| format!("'{}'", cell.replace('\'', "''")))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", cells)
            })
            .collect::<Vec<_>>()
            .join(", ");

        self.statements.push(format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(table),
            Self::quoted_list(columns),
            values
        ));
        Ok(rows.len() as u64)
    }

    fn reset_sequence(&mut self, table: &str, column: &str) -> Result<()> {
        self.require_table(table)?;
        self.statements.push(format!(
            "SELECT setval(pg_get_serial_sequence('{}', '{}'), COALESCE(MAX({}), 0) + 1, false) FROM {}",
            table,
            column,
            quote_ident(column),
            quote_ident(table)
        ));
        Ok(())
    }

    fn db_type(&self) -> &str {
        "script"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_create_table_statement() {
        let mut driver = ScriptDriver::new();
        driver
            .create_table(
                "users",
                &[
                    ColumnDef::new("id", "bigint").not_null(),
                    ColumnDef::new("status", "text").default_expr("'active'"),
                ],
                None,
            )
            .unwrap();

        assert_eq!(
            driver.statements(),
            &["CREATE TABLE \"users\" (\"id\" bigint NOT NULL, \"status\" text DEFAULT 'active')"]
        );
    }

    #[test]
    fn test_create_table_with_options() {
        let mut driver = ScriptDriver::new();
        driver
            .create_table("users", &[ColumnDef::new("id", "bigint")], Some("WITH (fillfactor = 70)"))
            .unwrap();

        assert!(driver.statements()[0].ends_with("WITH (fillfactor = 70)"));
    }

    #[test]
    fn test_foreign_key_statement() {
        let mut driver = ScriptDriver::new().with_table("users").with_table("posts");
        driver
            .add_foreign_key(
                "posts_user_id_fkey",
                "posts",
                &cols(&["user_id"]),
                "users",
                &cols(&["id"]),
                Some("CASCADE"),
                None,
            )
            .unwrap();

        assert_eq!(
            driver.statements(),
            &["ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_user_id_fkey\" \
               FOREIGN KEY (\"user_id\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE"]
        );
    }

    #[test]
    fn test_unique_index_statement() {
        let mut driver = ScriptDriver::new().with_table("users");
        driver
            .create_index("users_email_idx", "users", &cols(&["email"]), true)
            .unwrap();

        assert_eq!(
            driver.statements(),
            &["CREATE UNIQUE INDEX \"users_email_idx\" ON \"users\" (\"email\")"]
        );
    }

    #[test]
    fn test_batch_insert_escapes_quotes() {
        let mut driver = ScriptDriver::new().with_table("users");
        let count = driver
            .batch_insert(
                "users",
                &cols(&["name"]),
                &[vec!["O'Brien".to_string()]],
            )
            .unwrap();

        assert_eq!(count, 1);
        assert!(driver.statements()[0].contains("'O''Brien'"));
    }

    #[test]
    fn test_script_terminates_statements() {
        let mut driver = ScriptDriver::new();
        driver.create_table("users", &[], None).unwrap();
        driver.drop_table("users").unwrap();

        let script = driver.script();
        assert_eq!(
            script,
            "CREATE TABLE \"users\" ();\nDROP TABLE \"users\";\n"
        );
    }

    #[test]
    fn test_catalog_tracks_script_state() {
        let mut driver = ScriptDriver::new();
        driver.create_table("users", &[], None).unwrap();
        assert_eq!(driver.table_names().unwrap(), vec!["users"]);
        assert!(driver.create_table("users", &[], None).is_err());
    }
}
