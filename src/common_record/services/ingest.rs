//! Service layer for appending and listing common records.

use crate::auth::{AccessError, CredentialVerifier, TokenSet};
use crate::common_record::{
    domain::{CommonRecord, CommonRecordDomainError, CommonToolName, NewCommonRecord, Sensitivity},
    ports::{CommonRecordStore, CommonRecordStoreError},
};
use crate::tool_registry::domain::{PageRequest, PaginationLimits};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Service-level errors for common record operations.
#[derive(Debug, Error)]
pub enum CommonRecordServiceError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] CommonRecordDomainError),
    /// A sensitive record was sent without a valid token.
    #[error("sensitive records require a valid token: {0}")]
    Unauthorized(AccessError),
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] CommonRecordStoreError),
}

/// Result type for common record service operations.
pub type CommonRecordServiceResult<T> = Result<T, CommonRecordServiceError>;

/// Appends records to the shared relation and lists them per tool.
pub struct CommonRecordService<S, V, C>
where
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    tokens: TokenSet<V>,
    clock: Arc<C>,
    limits: PaginationLimits,
}

impl<S, V, C> Clone for CommonRecordService<S, V, C>
where
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tokens: self.tokens.clone(),
            clock: Arc::clone(&self.clock),
            limits: self.limits,
        }
    }
}

impl<S, V, C> CommonRecordService<S, V, C>
where
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    /// Creates a service gated by `tokens` for sensitive records.
    #[must_use]
    pub fn new(store: Arc<S>, tokens: TokenSet<V>, clock: Arc<C>) -> Self {
        Self {
            store,
            tokens,
            clock,
            limits: PaginationLimits::default(),
        }
    }

    /// Replaces the pagination limits.
    #[must_use]
    pub const fn with_pagination(mut self, limits: PaginationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns [`CommonRecordServiceError::Unauthorized`] when `sensitive` is
    /// 1 and the token is missing or unknown, domain errors for an invalid
    /// flag, name or data, and store errors when the append fails.
    pub async fn store(
        &self,
        tool_name: &str,
        sensitive: i64,
        token: Option<&str>,
        data: Value,
    ) -> CommonRecordServiceResult<CommonRecord> {
        let sensitivity = Sensitivity::try_from(sensitive)?;
        if sensitivity.requires_token() {
            self.tokens
                .authorize(token)
                .map_err(CommonRecordServiceError::Unauthorized)?;
        }
        let name = CommonToolName::new(tool_name)?;
        let record = NewCommonRecord::new(name, data, sensitivity, &*self.clock)?;

        let stored = self.store.append(record).await?;
        debug!(
            tool = %stored.tool_name,
            id = stored.id,
            sensitive = stored.sensitive.as_flag(),
            "common record stored"
        );
        Ok(stored)
    }

    /// Lists one page of a tool's common records.
    ///
    /// # Errors
    ///
    /// Returns domain errors for an invalid name and store errors when the
    /// scan fails.
    pub async fn list(
        &self,
        tool_name: &str,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> CommonRecordServiceResult<Vec<CommonRecord>> {
        let name = CommonToolName::new(tool_name)?;
        let page = PageRequest::resolve(limit, offset, self.limits);
        Ok(self.store.list_by_tool(&name, page).await?)
    }
}
