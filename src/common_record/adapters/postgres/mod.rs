//! `PostgreSQL` adapter for the shared common-record relation.

mod models;
mod repository;
mod schema;

pub use repository::PostgresCommonRecordStore;
