//! Storage port for common records.

use crate::common_record::domain::{CommonRecord, CommonToolName, NewCommonRecord};
use crate::tool_registry::domain::PageRequest;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for common record store operations.
pub type CommonRecordStoreResult<T> = Result<T, CommonRecordStoreError>;

/// Append-only store backing the shared common-record relation.
#[async_trait]
pub trait CommonRecordStore: Send + Sync {
    /// Appends a record and returns it with its assigned identifier.
    async fn append(&self, record: NewCommonRecord) -> CommonRecordStoreResult<CommonRecord>;

    /// Returns one page of a tool's records in ascending `id` order.
    async fn list_by_tool(
        &self,
        tool_name: &CommonToolName,
        page: PageRequest,
    ) -> CommonRecordStoreResult<Vec<CommonRecord>>;
}

/// Errors returned by common record store implementations.
#[derive(Debug, Clone, Error)]
pub enum CommonRecordStoreError {
    /// A stored row could not be reconstructed into domain types.
    #[error("invalid persisted common record: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl CommonRecordStoreError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
