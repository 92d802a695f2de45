//! # dep-migrate
//!
//! Convention-driven schema migrations with foreign-key dependency
//! resolution.
//!
//! A migration unit declares one builder per table. The engine works out
//! a safe creation order on its own: while a builder runs, declaring a
//! foreign key first installs the referenced table, recursively, each
//! table at most once. The revert pass inverts the live schema's
//! foreign keys so that dropping a table first drops everything that
//! references it - including tables outside the migration unit.
//!
//! ## Example
//!
//! ```rust
//! use dep_migrate::{ColumnDef, MemoryDriver, Migration, TableUnit};
//!
//! fn main() -> dep_migrate::Result<()> {
//!     let units = vec![
//!         TableUnit::new("posts", |m: &mut Migration<MemoryDriver>| {
//!             m.create_table(
//!                 "posts",
//!                 &[
//!                     ColumnDef::new("id", "bigint").not_null(),
//!                     ColumnDef::new("user_id", "bigint").not_null(),
//!                 ],
//!                 None,
//!             )?;
//!             m.add_foreign_key(
//!                 "posts",
//!                 &["user_id".to_string()],
//!                 "users",
//!                 &["id".to_string()],
//!                 Some("CASCADE"),
//!                 None,
//!             )
//!         }),
//!         TableUnit::new("users", |m: &mut Migration<MemoryDriver>| {
//!             m.create_table("users", &[ColumnDef::new("id", "bigint").not_null()], None)
//!         }),
//!     ];
//!
//!     // posts is declared first, but users is built first.
//!     let mut migration = Migration::new(MemoryDriver::new(), units)?;
//!     migration.up()?;
//!     assert_eq!(migration.build_order(), &["users", "posts"]);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod driver;
pub mod drivers;
pub mod error;
pub mod index;
pub mod migration;
pub mod naming;
pub mod schema;

// Re-exports for convenient access
pub use config::MigrationOptions;
pub use driver::SchemaDriver;
pub use drivers::{DdlOp, MemoryDriver, ScriptDriver};
pub use error::{MigrateError, Result};
pub use index::ForeignTableIndex;
pub use migration::{Migration, MigrationReport, Phase, TableUnit};
pub use schema::{ColumnDef, ForeignKeyEdge};
