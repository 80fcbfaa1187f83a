//! Tool registration aggregate root and per-tenant lifecycle states.

use super::{ToolId, ToolName, ToolRegistryDomainError, ToolSchema};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use std::fmt;

/// Lifecycle state of one tenant.
///
/// Only `Registered` is durable: it is the presence of a registry row.
/// `Unregistered` is its absence, and the two transitional states exist only
/// for the duration of a registration or deregistration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolLifecycleState {
    /// No registry row exists.
    Unregistered,
    /// Registration is validating input and provisioning the relation.
    Registering,
    /// Registry row and relation both exist.
    Registered,
    /// Deregistration is dropping the relation and registry row.
    Deregistering,
}

impl ToolLifecycleState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registering => "registering",
            Self::Registered => "registered",
            Self::Deregistering => "deregistering",
        }
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// A failed registration returns to `Unregistered`; a failed strict
    /// deregistration returns to `Registered`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unregistered, Self::Registering)
                | (Self::Registering, Self::Registered | Self::Unregistered)
                | (Self::Registered, Self::Deregistering)
                | (Self::Deregistering, Self::Unregistered | Self::Registered)
        )
    }

    /// Validates a transition to `target` and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidLifecycleTransition`] when the
    /// transition is not allowed.
    pub fn transition_to(self, target: Self) -> Result<Self, ToolRegistryDomainError> {
        if self.can_transition_to(target) {
            return Ok(target);
        }
        Err(ToolRegistryDomainError::InvalidLifecycleTransition {
            from: self.as_str().to_owned(),
            to: target.as_str().to_owned(),
        })
    }
}

impl fmt::Display for ToolLifecycleState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Tool registration aggregate root.
///
/// The token is held in the at-rest form produced by the configured
/// credential verifier and is never serialized.
#[derive(Clone, PartialEq, Eq)]
pub struct ToolRegistration {
    id: ToolId,
    name: ToolName,
    token: String,
    schema: ToolSchema,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedToolData {
    /// Persisted tool identifier.
    pub id: ToolId,
    /// Persisted tool name.
    pub name: ToolName,
    /// Persisted at-rest token.
    pub token: String,
    /// Persisted schema.
    pub schema: ToolSchema,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ToolRegistration {
    /// Creates a new registration stamped with the clock's current time.
    #[must_use]
    pub fn new(
        name: ToolName,
        sealed_token: impl Into<String>,
        schema: ToolSchema,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ToolId::new(),
            name,
            token: sealed_token.into(),
            schema,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a registration from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedToolData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            token: data.token,
            schema: data.schema,
            created_at: data.created_at,
        }
    }

    /// Returns the registration identifier.
    #[must_use]
    pub const fn id(&self) -> ToolId {
        self.id
    }

    /// Returns the tool name.
    #[must_use]
    pub const fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the at-rest token.
    #[must_use]
    pub fn sealed_token(&self) -> &str {
        &self.token
    }

    /// Returns the immutable schema.
    #[must_use]
    pub const fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the public view of the registration.
    #[must_use]
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            tool_name: self.name.clone(),
            schema: self.schema.clone(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Debug for ToolRegistration {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ToolRegistration")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("token", &"<redacted>")
            .field("schema", &self.schema)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Token-free view of a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSummary {
    /// Tool name.
    pub tool_name: ToolName,
    /// Declared schema.
    pub schema: ToolSchema,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}
