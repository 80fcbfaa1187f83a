//! `PostgreSQL` adapters for the tool registry and per-tool relations.
//!
//! Registry rows go through Diesel's typed query builder. Per-tool relations
//! are only known at runtime, so their DDL and record I/O are issued as raw
//! SQL built by [`ddl`] with every identifier quoted.

pub mod ddl;
mod models;
mod pool;
mod repository;
mod schema;
mod table_store;

pub use pool::{PgPool, connect_pool};
pub use repository::PostgresToolRegistry;
pub use table_store::PostgresToolTableStore;
