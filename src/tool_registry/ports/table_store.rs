//! Storage port for per-tool relations.

use crate::tool_registry::domain::{PageRequest, RelationDefinition, StoredRecord, ToolRecord};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for table store operations.
pub type TableStoreResult<T> = Result<T, TableStoreError>;

/// Outcome of [`ToolTableStore::create_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationCreation {
    /// The relation did not exist and was created by this call.
    Created,
    /// A relation with the same name already existed; nothing changed.
    AlreadyPresent,
}

/// Durable table store holding one relation per registered tool.
///
/// Relations are described by [`RelationDefinition`] values; the store never
/// interprets tool schemas itself.
#[async_trait]
pub trait ToolTableStore: Send + Sync {
    /// Creates the relation unless one with the same name exists.
    async fn create_if_absent(
        &self,
        relation: &RelationDefinition,
    ) -> TableStoreResult<RelationCreation>;

    /// Drops the relation if it exists.
    async fn drop_if_exists(&self, relation: &RelationDefinition) -> TableStoreResult<()>;

    /// Inserts one record and returns its assigned `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TableStoreError::MissingRelation`] when the relation does
    /// not exist and [`TableStoreError::Rejected`] when the store refuses a
    /// value for its column type.
    async fn insert(
        &self,
        relation: &RelationDefinition,
        record: &ToolRecord,
    ) -> TableStoreResult<i64>;

    /// Returns one page of records in ascending `id` order.
    async fn select_page(
        &self,
        relation: &RelationDefinition,
        page: PageRequest,
    ) -> TableStoreResult<Vec<StoredRecord>>;
}

/// Errors returned by table store implementations.
#[derive(Debug, Clone, Error)]
pub enum TableStoreError {
    /// The relation does not exist.
    #[error("relation '{0}' does not exist")]
    MissingRelation(String),

    /// A relation with the synthesized name exists but no registration owns
    /// it.
    #[error("relation '{0}' already exists without a registration")]
    Orphaned(String),

    /// The store refused a value.
    #[error("relation '{relation}' rejected the record: {reason}")]
    Rejected {
        /// Relation name.
        relation: String,
        /// Store-provided reason.
        reason: String,
    },

    /// Storage-engine failure.
    #[error("table store error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl TableStoreError {
    /// Wraps a storage-engine failure.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
