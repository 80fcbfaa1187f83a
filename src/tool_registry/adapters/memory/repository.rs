//! In-memory repository for tool registrations.

use crate::tool_registry::{
    domain::{ToolId, ToolName, ToolRegistration},
    ports::{ToolRegistryError, ToolRegistryRepository, ToolRegistryResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory tool registry.
///
/// Name uniqueness is enforced under the write lock, which plays the role of
/// the unique constraint in the `PostgreSQL` adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryToolRegistry {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    tools: BTreeMap<ToolName, ToolRegistration>,
    id_index: HashMap<ToolId, ToolName>,
    unavailable: Option<String>,
}

impl InMemoryToolRegistry {
    /// Creates an empty in-memory registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a persistence error until
    /// cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn set_unavailable(&self, reason: Option<String>) -> ToolRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        state.unavailable = reason;
        Ok(())
    }
}

fn ensure_available(state: &InMemoryRegistryState) -> ToolRegistryResult<()> {
    state.unavailable.as_ref().map_or(Ok(()), |reason| {
        Err(ToolRegistryError::persistence(std::io::Error::other(
            reason.clone(),
        )))
    })
}

#[async_trait]
impl ToolRegistryRepository for InMemoryToolRegistry {
    async fn register(&self, registration: &ToolRegistration) -> ToolRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        ensure_available(&state)?;

        if state.id_index.contains_key(&registration.id()) {
            return Err(ToolRegistryError::DuplicateTool(registration.id()));
        }

        if state.tools.contains_key(registration.name()) {
            return Err(ToolRegistryError::DuplicateToolName(
                registration.name().clone(),
            ));
        }

        state
            .id_index
            .insert(registration.id(), registration.name().clone());
        state
            .tools
            .insert(registration.name().clone(), registration.clone());
        Ok(())
    }

    async fn find_by_name(&self, name: &ToolName) -> ToolRegistryResult<Option<ToolRegistration>> {
        let state = self.state.read().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        ensure_available(&state)?;
        Ok(state.tools.get(name).cloned())
    }

    async fn deregister(&self, name: &ToolName) -> ToolRegistryResult<()> {
        let mut state = self.state.write().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        ensure_available(&state)?;

        let removed = state
            .tools
            .remove(name)
            .ok_or_else(|| ToolRegistryError::NotFound(name.clone()))?;
        state.id_index.remove(&removed.id());
        Ok(())
    }

    async fn list_all(&self) -> ToolRegistryResult<Vec<ToolRegistration>> {
        let state = self.state.read().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        ensure_available(&state)?;
        Ok(state.tools.values().cloned().collect())
    }

    async fn ping(&self) -> ToolRegistryResult<()> {
        let state = self.state.read().map_err(|err| {
            ToolRegistryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        ensure_available(&state)
    }
}
