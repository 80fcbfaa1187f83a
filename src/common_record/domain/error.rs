//! Error types for common record validation.

use thiserror::Error;

/// Errors returned while constructing common record values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommonRecordDomainError {
    /// The tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// The tool name is longer than the shared relation allows.
    #[error("tool name exceeds 50 character limit: {0}")]
    ToolNameTooLong(String),

    /// The sensitivity flag is neither 0 nor 1.
    #[error("sensitive must be 0 or 1, got {0}")]
    InvalidSensitivity(i64),

    /// The record data is not a JSON object.
    #[error("record data must be a JSON object, got {observed}")]
    DataNotAnObject {
        /// JSON kind of the rejected data.
        observed: &'static str,
    },
}
