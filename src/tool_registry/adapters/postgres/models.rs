//! Diesel row models for tool registry persistence.

use super::schema::tool_registrations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Bool, Jsonb};
use serde_json::Value;

/// Query result row for tool registrations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tool_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ToolRegistrationRow {
    /// Internal tool identifier.
    pub id: uuid::Uuid,
    /// Unique tool name.
    pub name: String,
    /// At-rest token.
    pub token: String,
    /// Persisted schema document.
    pub schema: Value,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for tool registrations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tool_registrations)]
pub struct NewToolRegistrationRow {
    /// Internal tool identifier.
    pub id: uuid::Uuid,
    /// Unique tool name.
    pub name: String,
    /// At-rest token.
    pub token: String,
    /// Canonical schema document.
    pub schema: Value,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// `id` returned from a dynamic insert.
#[derive(Debug, QueryableByName)]
pub struct InsertedIdRow {
    /// Assigned record identifier.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
}

/// One record of a tool relation rendered as a JSON object.
#[derive(Debug, QueryableByName)]
pub struct RecordRow {
    /// Whole row as produced by `to_jsonb`.
    #[diesel(sql_type = Jsonb)]
    pub record: Value,
}

/// Result of a relation existence probe.
#[derive(Debug, QueryableByName)]
pub struct PresenceRow {
    /// Whether the relation exists.
    #[diesel(sql_type = Bool)]
    pub present: bool,
}
