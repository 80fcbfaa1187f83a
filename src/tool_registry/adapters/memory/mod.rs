//! In-memory adapters for tool registry and table store ports.
//!
//! These adapters back the test suite and deterministic local flows. Both
//! expose failure-injection hooks so orchestration error paths can be
//! exercised without a database.

mod repository;
mod table_store;

pub use repository::InMemoryToolRegistry;
pub use table_store::InMemoryToolTableStore;
