//! Port contracts for tool registration and per-tool storage.

mod repository;
mod table_store;

pub use repository::{ToolRegistryError, ToolRegistryRepository, ToolRegistryResult};
pub use table_store::{RelationCreation, TableStoreError, TableStoreResult, ToolTableStore};
