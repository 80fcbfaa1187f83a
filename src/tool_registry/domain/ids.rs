//! Identifier and validated-name types for registered tools.

use super::ToolRegistryDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for a tool name.
///
/// Relations are named `<prefix><tool name>`; with a prefix of at most five
/// characters this keeps the relation inside `PostgreSQL`'s 63-byte
/// identifier limit.
pub(crate) const MAX_TOOL_NAME_LENGTH: usize = 58;

/// Unique identifier for a tool registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(Uuid);

impl ToolId {
    /// Creates a new random tool identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tool identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ToolId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for ToolId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated tool (tenant) name.
///
/// Names are matched exactly: surrounding whitespace is trimmed but case is
/// preserved, so `Survey` and `survey` are distinct tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Creates a validated tool name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::EmptyToolName`] when the trimmed
    /// value is empty, [`ToolRegistryDomainError::ToolNameTooLong`] when it
    /// exceeds 58 characters, or
    /// [`ToolRegistryDomainError::InvalidToolName`] when it contains
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ToolRegistryDomainError::EmptyToolName);
        }

        if trimmed.len() > MAX_TOOL_NAME_LENGTH {
            return Err(ToolRegistryDomainError::ToolNameTooLong(trimmed.to_owned()));
        }

        let is_valid = trimmed
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'));
        if !is_valid {
            return Err(ToolRegistryDomainError::InvalidToolName(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the tool name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = ToolRegistryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
