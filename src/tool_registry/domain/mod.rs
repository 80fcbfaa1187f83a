//! Domain model for tool registration and per-tool storage.
//!
//! The tool registry domain models tool identity, schemas, record payloads,
//! relation definitions and the tenant lifecycle. Infrastructure concerns
//! remain outside this boundary.

mod error;
mod ids;
mod page;
mod payload;
mod registration;
mod relation;
mod schema;

pub use error::{PayloadValidationError, SchemaError, ToolRegistryDomainError};
pub use ids::{ToolId, ToolName};
pub use page::{PageRequest, PaginationLimits};
pub use payload::{ToolRecord, validate_payload};
pub use registration::{PersistedToolData, ToolLifecycleState, ToolRegistration, ToolSummary};
pub use relation::{
    ColumnDefinition, ColumnRole, ColumnType, DEFAULT_TABLE_PREFIX, RelationDefinition,
    TableSynthesizer,
};
pub use schema::{FieldType, SchemaField, ToolSchema, validate_schema};
pub(crate) use schema::json_kind;

/// A record as read back from a tool relation, including `id` and
/// `created_at`.
pub type StoredRecord = serde_json::Map<String, serde_json::Value>;
