//! In-tree schema-driver implementations.
//!
//! - [`memory`]: in-memory catalog with an ordered DDL log, used as a
//!   test double and for dry runs
//! - [`script`]: renders every call as a PostgreSQL DDL statement
//!
//! Physical network drivers live outside this crate; anything that can
//! report its catalog and execute DDL can implement
//! [`SchemaDriver`](crate::driver::SchemaDriver).

pub mod memory;
pub mod script;

pub use memory::{DdlOp, MemoryDriver};
pub use script::ScriptDriver;
