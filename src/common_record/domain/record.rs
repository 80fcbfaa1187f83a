//! Common record value types.

use super::CommonRecordDomainError;
use crate::tool_registry::domain::json_kind;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Longest tool name the shared relation stores.
const MAX_COMMON_TOOL_NAME_LENGTH: usize = 50;

/// Free-form tool name attached to a common record.
///
/// Unlike registry tool names this is not an identifier, so any characters
/// are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommonToolName(String);

impl CommonToolName {
    /// Creates a validated name from trimmed input.
    ///
    /// # Errors
    ///
    /// Returns [`CommonRecordDomainError`] when the name is empty or longer
    /// than 50 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, CommonRecordDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CommonRecordDomainError::EmptyToolName);
        }
        if trimmed.chars().count() > MAX_COMMON_TOOL_NAME_LENGTH {
            return Err(CommonRecordDomainError::ToolNameTooLong(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommonToolName {
    type Error = CommonRecordDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommonToolName> for String {
    fn from(name: CommonToolName) -> Self {
        name.0
    }
}

impl fmt::Display for CommonToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Whether a record requires a token to be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i16")]
pub enum Sensitivity {
    /// Flag `0`: anyone may write.
    #[default]
    Public,
    /// Flag `1`: a token from the static set is required.
    Sensitive,
}

impl Sensitivity {
    /// Returns the stored flag value.
    #[must_use]
    pub const fn as_flag(self) -> i16 {
        match self {
            Self::Public => 0,
            Self::Sensitive => 1,
        }
    }

    /// Returns whether writes require a token.
    #[must_use]
    pub const fn requires_token(self) -> bool {
        matches!(self, Self::Sensitive)
    }
}

impl TryFrom<i64> for Sensitivity {
    type Error = CommonRecordDomainError;

    fn try_from(flag: i64) -> Result<Self, Self::Error> {
        match flag {
            0 => Ok(Self::Public),
            1 => Ok(Self::Sensitive),
            other => Err(CommonRecordDomainError::InvalidSensitivity(other)),
        }
    }
}

impl From<Sensitivity> for i16 {
    fn from(sensitivity: Sensitivity) -> Self {
        sensitivity.as_flag()
    }
}

/// A common record that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCommonRecord {
    tool_name: CommonToolName,
    data: Map<String, Value>,
    sensitivity: Sensitivity,
    created_at: DateTime<Utc>,
}

impl NewCommonRecord {
    /// Creates a record stamped with the clock's current time.
    ///
    /// # Errors
    ///
    /// Returns [`CommonRecordDomainError::DataNotAnObject`] unless `data` is
    /// a JSON object.
    pub fn new(
        tool_name: CommonToolName,
        data: Value,
        sensitivity: Sensitivity,
        clock: &impl Clock,
    ) -> Result<Self, CommonRecordDomainError> {
        let document = match data {
            Value::Object(map) => map,
            other => {
                return Err(CommonRecordDomainError::DataNotAnObject {
                    observed: json_kind(&other),
                });
            }
        };
        Ok(Self {
            tool_name,
            data: document,
            sensitivity,
            created_at: clock.utc(),
        })
    }

    /// Returns the tool name.
    #[must_use]
    pub const fn tool_name(&self) -> &CommonToolName {
        &self.tool_name
    }

    /// Returns the record data.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Returns the sensitivity flag.
    #[must_use]
    pub const fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attaches the store-assigned identifier.
    #[must_use]
    pub fn into_stored(self, id: i64) -> CommonRecord {
        CommonRecord {
            id,
            tool_name: self.tool_name,
            data: Value::Object(self.data),
            sensitive: self.sensitivity,
            created_at: self.created_at,
        }
    }
}

/// A stored common record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonRecord {
    /// Store-assigned identifier.
    pub id: i64,
    /// Tool that sent the record.
    pub tool_name: CommonToolName,
    /// Record data.
    pub data: Value,
    /// Sensitivity flag.
    pub sensitive: Sensitivity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
