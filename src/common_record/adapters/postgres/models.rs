//! Diesel row models for common record persistence.

use super::schema::common_records;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for common records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = common_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommonRecordRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Tool that sent the record.
    pub tool_name: String,
    /// Record data.
    pub data: Value,
    /// Sensitivity flag.
    pub sensitive: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for common records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = common_records)]
pub struct NewCommonRecordRow {
    /// Tool that sent the record.
    pub tool_name: String,
    /// Record data.
    pub data: Value,
    /// Sensitivity flag.
    pub sensitive: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
