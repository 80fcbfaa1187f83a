//! Error types for tool registry domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing tool registry domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolRegistryDomainError {
    /// The tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// The tool name contains characters outside `[A-Za-z0-9_-]`.
    #[error(
        "tool name '{0}' contains invalid characters (only ASCII letters, digits, '_' and '-' allowed)"
    )]
    InvalidToolName(String),

    /// The tool name would overflow the relation identifier limit.
    #[error("tool name exceeds 58 character limit: {0}")]
    ToolNameTooLong(String),

    /// The per-tool token is empty after trimming.
    #[error("tool token must not be empty")]
    EmptyToken,

    /// The relation prefix is empty, too long, or not a plain identifier.
    #[error("table prefix '{0}' must be 1 to 5 characters of [a-z0-9_] starting with a letter")]
    InvalidTablePrefix(String),

    /// Transitioning between two lifecycle states is invalid.
    #[error("invalid tool lifecycle transition: {from} -> {to}")]
    InvalidLifecycleTransition {
        /// Current lifecycle state.
        from: String,
        /// Requested target lifecycle state.
        to: String,
    },
}

/// Errors raised while validating a proposed tool schema.
///
/// Validation stops at the first violation; no partial-validity report is
/// produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema definition is not a JSON array.
    #[error("schema must be a list of fields, got {observed}")]
    NotASequence {
        /// JSON kind of the rejected definition.
        observed: &'static str,
    },

    /// A schema entry is not a JSON object.
    #[error("schema field #{index} must be an object with 'name' and 'type', got {observed}")]
    FieldNotAnObject {
        /// Position of the entry in the schema.
        index: usize,
        /// JSON kind of the rejected entry.
        observed: &'static str,
    },

    /// A schema entry lacks `name` or `type`.
    #[error("schema field #{index} is missing '{key}'")]
    MissingKey {
        /// Position of the entry in the schema.
        index: usize,
        /// Name of the missing key.
        key: &'static str,
    },

    /// A schema entry carries keys other than `name` and `type`.
    #[error("schema field #{index} has unexpected key '{key}' (only 'name' and 'type' allowed)")]
    UnexpectedKey {
        /// Position of the entry in the schema.
        index: usize,
        /// The unexpected key.
        key: String,
    },

    /// `name` or `type` is not a JSON string.
    #[error("schema field #{index} key '{key}' must be a string, got {observed}")]
    NonStringValue {
        /// Position of the entry in the schema.
        index: usize,
        /// Offending key.
        key: &'static str,
        /// JSON kind of the rejected value.
        observed: &'static str,
    },

    /// The type tag is outside the supported vocabulary.
    #[error("Unsupported type: {type_tag}. Allowed: {}", allowed.join(", "))]
    UnsupportedType {
        /// The lower-cased tag that was rejected.
        type_tag: String,
        /// Every accepted tag, aliases included.
        allowed: Vec<&'static str>,
    },

    /// The field name is not a usable column identifier.
    #[error(
        "field name '{0}' must match [A-Za-z_][A-Za-z0-9_]* and be at most 63 characters long"
    )]
    InvalidFieldName(String),

    /// The field name collides with a column every tool table carries.
    #[error("field name '{0}' is reserved")]
    ReservedFieldName(String),

    /// The same field name appears more than once.
    #[error("field name '{0}' is declared more than once")]
    DuplicateField(String),
}

/// Error raised when a record does not satisfy its tool schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PayloadValidationError {
    /// The payload is not a JSON object.
    #[error("payload must be a JSON object, got {observed}")]
    NotAnObject {
        /// JSON kind of the rejected payload.
        observed: &'static str,
    },

    /// A field value does not match its declared type.
    #[error("Field '{field}' expected {expected}, got {observed}")]
    TypeMismatch {
        /// Offending field.
        field: String,
        /// Declared type tag.
        expected: &'static str,
        /// JSON kind of the supplied value.
        observed: &'static str,
    },
}
