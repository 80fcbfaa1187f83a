//! Repository port for the durable tool registry.

use crate::tool_registry::domain::{ToolId, ToolName, ToolRegistration};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for tool registry operations.
pub type ToolRegistryResult<T> = Result<T, ToolRegistryError>;

/// Persistence contract for tool registrations.
///
/// The registry row is the single source of truth for a tool's token and
/// schema. Implementations must enforce name uniqueness in the store itself
/// so that two concurrent registrations cannot both succeed.
#[async_trait]
pub trait ToolRegistryRepository: Send + Sync {
    /// Stores a new registration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryError::DuplicateToolName`] when the name is
    /// already registered or [`ToolRegistryError::DuplicateTool`] when the
    /// identifier already exists.
    async fn register(&self, registration: &ToolRegistration) -> ToolRegistryResult<()>;

    /// Finds a registration by exact name.
    async fn find_by_name(&self, name: &ToolName) -> ToolRegistryResult<Option<ToolRegistration>>;

    /// Deletes the registration with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryError::NotFound`] when no registration exists.
    async fn deregister(&self, name: &ToolName) -> ToolRegistryResult<()>;

    /// Returns all registrations ordered by name.
    async fn list_all(&self) -> ToolRegistryResult<Vec<ToolRegistration>>;

    /// Checks that the backing store is reachable.
    async fn ping(&self) -> ToolRegistryResult<()>;
}

/// Errors returned by tool registry repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ToolRegistryError {
    /// A registration with the same identifier already exists.
    #[error("duplicate tool identifier: {0}")]
    DuplicateTool(ToolId),

    /// A registration with the same name already exists.
    #[error("tool '{0}' is already registered")]
    DuplicateToolName(ToolName),

    /// The registration was not found.
    #[error("tool not found: {0}")]
    NotFound(ToolName),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted tool registration: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ToolRegistryError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
