//! In-memory common record store.

use crate::common_record::{
    domain::{CommonRecord, CommonToolName, NewCommonRecord},
    ports::{CommonRecordStore, CommonRecordStoreError, CommonRecordStoreResult},
};
use crate::tool_registry::domain::PageRequest;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory common record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCommonRecordStore {
    state: Arc<RwLock<InMemoryCommonState>>,
}

#[derive(Debug, Default)]
struct InMemoryCommonState {
    records: Vec<CommonRecord>,
    next_id: i64,
}

impl InMemoryCommonRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record regardless of tool.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn all(&self) -> CommonRecordStoreResult<Vec<CommonRecord>> {
        let state = self.state.read().map_err(|err| {
            CommonRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.records.clone())
    }
}

#[async_trait]
impl CommonRecordStore for InMemoryCommonRecordStore {
    async fn append(&self, record: NewCommonRecord) -> CommonRecordStoreResult<CommonRecord> {
        let mut state = self.state.write().map_err(|err| {
            CommonRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.next_id = state.next_id.saturating_add(1);
        let stored = record.into_stored(state.next_id);
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_tool(
        &self,
        tool_name: &CommonToolName,
        page: PageRequest,
    ) -> CommonRecordStoreResult<Vec<CommonRecord>> {
        let state = self.state.read().map_err(|err| {
            CommonRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(state
            .records
            .iter()
            .filter(|record| &record.tool_name == tool_name)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }
}
