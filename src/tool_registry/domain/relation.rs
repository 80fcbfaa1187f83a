//! Relation definitions and the table synthesizer.
//!
//! The synthesizer maps a tool name and schema to the storage relation that
//! holds the tool's records. It is a pure function of its inputs: the same
//! `(tool name, schema)` pair always yields the same definition, so write
//! and read paths can re-derive the relation from the registry row instead
//! of caching it.

use super::{FieldType, ToolName, ToolRegistryDomainError, ToolSchema};
use serde::Serialize;
use std::fmt;

/// Relation prefix used when none is configured.
pub const DEFAULT_TABLE_PREFIX: &str = "tool_";

/// Longest prefix that keeps every relation name within 63 bytes.
const MAX_TABLE_PREFIX_LENGTH: usize = 5;

/// Storage type of a relation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Auto-incrementing 64-bit key.
    Serial,
    /// 64-bit integer.
    BigInt,
    /// Unbounded text.
    Text,
    /// Boolean.
    Boolean,
    /// Binary JSON document.
    Jsonb,
    /// 64-bit float.
    DoublePrecision,
    /// Timestamp with time zone.
    Timestamptz,
}

impl ColumnType {
    /// Returns the SQL spelling of the column type.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Serial => "BIGSERIAL",
            Self::BigInt => "BIGINT",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Jsonb => "JSONB",
            Self::DoublePrecision => "DOUBLE PRECISION",
            Self::Timestamptz => "TIMESTAMPTZ",
        }
    }
}

impl From<FieldType> for ColumnType {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Int => Self::BigInt,
            FieldType::String => Self::Text,
            FieldType::Bool => Self::Boolean,
            FieldType::Json => Self::Jsonb,
            FieldType::Float => Self::DoublePrecision,
            FieldType::Timestamp => Self::Timestamptz,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.sql_name())
    }
}

/// Role a column plays in the relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Auto-assigned primary key.
    PrimaryKey,
    /// Insertion timestamp assigned by the store.
    InsertedAt,
    /// Nullable column backing a schema field.
    Field,
}

/// One column of a relation definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnDefinition {
    name: String,
    column_type: ColumnType,
    role: ColumnRole,
}

impl ColumnDefinition {
    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the storage type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Returns the column role.
    #[must_use]
    pub const fn role(&self) -> ColumnRole {
        self.role
    }

    /// Returns whether the column accepts `NULL`.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        matches!(self.role, ColumnRole::Field)
    }
}

/// Concrete storage relation for one tool.
///
/// Columns are always `id`, `created_at`, then one nullable column per
/// schema field in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationDefinition {
    name: String,
    columns: Vec<ColumnDefinition>,
}

impl RelationDefinition {
    /// Returns the relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every column in definition order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the columns backing schema fields.
    pub fn field_columns(&self) -> impl Iterator<Item = &ColumnDefinition> {
        self.columns
            .iter()
            .filter(|column| column.role == ColumnRole::Field)
    }

    /// Finds a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Derives relation definitions from tool schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSynthesizer {
    prefix: String,
}

impl TableSynthesizer {
    /// Creates a synthesizer that names relations `<prefix><tool name>`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolRegistryDomainError::InvalidTablePrefix`] unless the
    /// prefix is 1 to 5 characters of `[a-z0-9_]` starting with a letter.
    pub fn new(value: impl Into<String>) -> Result<Self, ToolRegistryDomainError> {
        let prefix = value.into();
        let starts_with_letter = prefix
            .chars()
            .next()
            .is_some_and(|first| first.is_ascii_lowercase());
        let is_plain = prefix.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_'
        });

        if !starts_with_letter || !is_plain || prefix.len() > MAX_TABLE_PREFIX_LENGTH {
            return Err(ToolRegistryDomainError::InvalidTablePrefix(prefix));
        }
        Ok(Self { prefix })
    }

    /// Returns the configured relation prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the relation name for a tool.
    #[must_use]
    pub fn relation_name(&self, tool_name: &ToolName) -> String {
        format!("{}{}", self.prefix, tool_name.as_str())
    }

    /// Builds the relation definition for a tool.
    #[must_use]
    pub fn synthesize(&self, tool_name: &ToolName, schema: &ToolSchema) -> RelationDefinition {
        let fixed = [
            ColumnDefinition {
                name: "id".to_owned(),
                column_type: ColumnType::Serial,
                role: ColumnRole::PrimaryKey,
            },
            ColumnDefinition {
                name: "created_at".to_owned(),
                column_type: ColumnType::Timestamptz,
                role: ColumnRole::InsertedAt,
            },
        ];
        let fields = schema.fields().iter().map(|field| ColumnDefinition {
            name: field.name().to_owned(),
            column_type: field.field_type().into(),
            role: ColumnRole::Field,
        });

        RelationDefinition {
            name: self.relation_name(tool_name),
            columns: fixed.into_iter().chain(fields).collect(),
        }
    }
}

impl Default for TableSynthesizer {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_TABLE_PREFIX.to_owned(),
        }
    }
}
