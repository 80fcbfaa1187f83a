//! In-memory table store for per-tool relations.

use crate::tool_registry::{
    domain::{ColumnType, PageRequest, RelationDefinition, StoredRecord, ToolRecord},
    ports::{RelationCreation, TableStoreError, TableStoreResult, ToolTableStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory table store.
///
/// Each relation keeps its rows in insertion order with a monotonically
/// increasing `id`. Values are admitted per column type roughly the way
/// `PostgreSQL` coerces JSON input, so pass-through fields that the store
/// cannot hold are rejected here too. `created_at` is stamped from the
/// injected clock.
#[derive(Debug)]
pub struct InMemoryToolTableStore<C: Clock + Send + Sync> {
    state: Arc<RwLock<InMemoryStoreState>>,
    clock: C,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    relations: HashMap<String, InMemoryRelation>,
    create_failure: Option<String>,
    drop_failure: Option<String>,
}

#[derive(Debug)]
struct InMemoryRelation {
    definition: RelationDefinition,
    rows: Vec<StoredRecord>,
    next_id: i64,
}

impl<C: Clock + Send + Sync> InMemoryToolTableStore<C> {
    /// Creates an empty store stamping rows with `clock`.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryStoreState::default())),
            clock,
        }
    }

    /// Makes relation creation fail with `reason` until cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn fail_creates(&self, reason: Option<String>) -> TableStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        state.create_failure = reason;
        Ok(())
    }

    /// Makes relation drops fail with `reason` until cleared with `None`.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn fail_drops(&self, reason: Option<String>) -> TableStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        state.drop_failure = reason;
        Ok(())
    }

    /// Returns whether a relation with `name` exists.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn contains_relation(&self, name: &str) -> TableStoreResult<bool> {
        let state = self
            .state
            .read()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        Ok(state.relations.contains_key(name))
    }

    /// Returns the number of rows stored in `name`, if it exists.
    ///
    /// # Errors
    ///
    /// Returns backend errors when lock acquisition fails.
    pub fn row_count(&self, name: &str) -> TableStoreResult<Option<usize>> {
        let state = self
            .state
            .read()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        Ok(state.relations.get(name).map(|relation| relation.rows.len()))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> ToolTableStore for InMemoryToolTableStore<C> {
    async fn create_if_absent(
        &self,
        relation: &RelationDefinition,
    ) -> TableStoreResult<RelationCreation> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        if let Some(reason) = &state.create_failure {
            return Err(TableStoreError::backend(std::io::Error::other(
                reason.clone(),
            )));
        }

        if state.relations.contains_key(relation.name()) {
            return Ok(RelationCreation::AlreadyPresent);
        }

        state.relations.insert(
            relation.name().to_owned(),
            InMemoryRelation {
                definition: relation.clone(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        Ok(RelationCreation::Created)
    }

    async fn drop_if_exists(&self, relation: &RelationDefinition) -> TableStoreResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        if let Some(reason) = &state.drop_failure {
            return Err(TableStoreError::backend(std::io::Error::other(
                reason.clone(),
            )));
        }

        state.relations.remove(relation.name());
        Ok(())
    }

    async fn insert(
        &self,
        relation: &RelationDefinition,
        record: &ToolRecord,
    ) -> TableStoreResult<i64> {
        let mut state = self
            .state
            .write()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        let stored = state
            .relations
            .get_mut(relation.name())
            .ok_or_else(|| TableStoreError::MissingRelation(relation.name().to_owned()))?;
        if stored.definition != *relation {
            return Err(TableStoreError::Rejected {
                relation: relation.name().to_owned(),
                reason: "stored columns do not match the relation definition".to_owned(),
            });
        }

        let mut row = StoredRecord::new();
        let id = stored.next_id;
        row.insert("id".to_owned(), Value::from(id));
        row.insert(
            "created_at".to_owned(),
            Value::String(self.clock.utc().to_rfc3339()),
        );
        for column in relation.field_columns() {
            let value = record
                .values()
                .get(column.name())
                .cloned()
                .unwrap_or(Value::Null);
            let admitted = admit(column.column_type(), value).ok_or_else(|| {
                TableStoreError::Rejected {
                    relation: relation.name().to_owned(),
                    reason: format!(
                        "column '{}' cannot hold the supplied value as {}",
                        column.name(),
                        column.column_type()
                    ),
                }
            })?;
            row.insert(column.name().to_owned(), admitted);
        }

        stored.rows.push(row);
        stored.next_id = id.saturating_add(1);
        Ok(id)
    }

    async fn select_page(
        &self,
        relation: &RelationDefinition,
        page: PageRequest,
    ) -> TableStoreResult<Vec<StoredRecord>> {
        let state = self
            .state
            .read()
            .map_err(|err| TableStoreError::backend(std::io::Error::other(err.to_string())))?;
        let stored = state
            .relations
            .get(relation.name())
            .ok_or_else(|| TableStoreError::MissingRelation(relation.name().to_owned()))?;

        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(stored.rows.iter().skip(skip).take(take).cloned().collect())
    }
}

/// Coerces `value` into the representation `column_type` holds.
///
/// Returns `None` when the store would refuse the value.
fn admit(column_type: ColumnType, value: Value) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match column_type {
        ColumnType::Serial | ColumnType::BigInt => value.as_i64().map(Value::from),
        ColumnType::Text => match value {
            Value::String(_) => Some(value),
            Value::Number(_) | Value::Bool(_) => Some(Value::String(value.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        },
        ColumnType::Boolean => value.is_boolean().then_some(value),
        ColumnType::Jsonb => Some(value),
        ColumnType::DoublePrecision => match &value {
            Value::Number(_) => Some(value),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),
            Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
        },
        ColumnType::Timestamptz => match &value {
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|timestamp| Value::String(timestamp.with_timezone(&Utc).to_rfc3339())),
            Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::Array(_)
            | Value::Object(_) => None,
        },
    }
}
