//! `PostgreSQL` table store for per-tool relations.

use super::{
    PgPool, ddl,
    models::{InsertedIdRow, PresenceRow, RecordRow},
};
use crate::tool_registry::{
    domain::{PageRequest, RelationDefinition, StoredRecord, ToolRecord},
    ports::{RelationCreation, TableStoreError, TableStoreResult, ToolTableStore},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Jsonb, Text};
use serde_json::Value;
use tracing::debug;

/// `PostgreSQL`-backed store holding one table per registered tool.
#[derive(Debug, Clone)]
pub struct PostgresToolTableStore {
    pool: PgPool,
}

impl PostgresToolTableStore {
    /// Creates a new store from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> TableStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TableStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TableStoreError::backend)?;
            operation(&mut connection)
        })
        .await
        .map_err(TableStoreError::backend)?
    }
}

fn relation_exists(connection: &mut PgConnection, name: &str) -> TableStoreResult<bool> {
    let probe = diesel::sql_query(ddl::relation_exists())
        .bind::<Text, _>(ddl::quote_identifier(name))
        .get_result::<PresenceRow>(connection)
        .map_err(TableStoreError::backend)?;
    Ok(probe.present)
}

fn ensure_exists(connection: &mut PgConnection, name: &str) -> TableStoreResult<()> {
    if relation_exists(connection, name)? {
        Ok(())
    } else {
        Err(TableStoreError::MissingRelation(name.to_owned()))
    }
}

/// Maps value-level refusals to [`TableStoreError::Rejected`]; everything
/// else is a backend failure.
fn map_write_error(err: DieselError, relation: &str) -> TableStoreError {
    match err {
        DieselError::DatabaseError(
            DatabaseErrorKind::Unknown
            | DatabaseErrorKind::NotNullViolation
            | DatabaseErrorKind::CheckViolation,
            ref info,
        ) => TableStoreError::Rejected {
            relation: relation.to_owned(),
            reason: info.message().to_owned(),
        },
        _ => TableStoreError::backend(err),
    }
}

#[async_trait]
impl ToolTableStore for PostgresToolTableStore {
    async fn create_if_absent(
        &self,
        relation: &RelationDefinition,
    ) -> TableStoreResult<RelationCreation> {
        let name = relation.name().to_owned();
        let statement = ddl::create_table(relation);
        self.run_blocking(move |connection| {
            if relation_exists(connection, &name)? {
                return Ok(RelationCreation::AlreadyPresent);
            }
            debug!(relation = %name, sql = %statement, "creating relation");
            diesel::sql_query(statement)
                .execute(connection)
                .map_err(TableStoreError::backend)?;
            Ok(RelationCreation::Created)
        })
        .await
    }

    async fn drop_if_exists(&self, relation: &RelationDefinition) -> TableStoreResult<()> {
        let statement = ddl::drop_table(relation);
        self.run_blocking(move |connection| {
            diesel::sql_query(statement)
                .execute(connection)
                .map_err(TableStoreError::backend)?;
            Ok(())
        })
        .await
    }

    async fn insert(
        &self,
        relation: &RelationDefinition,
        record: &ToolRecord,
    ) -> TableStoreResult<i64> {
        let name = relation.name().to_owned();
        let statement = ddl::insert_record(relation);
        let has_fields = relation.field_columns().next().is_some();
        let document = record.to_json();
        self.run_blocking(move |connection| {
            ensure_exists(connection, &name)?;
            let inserted = if has_fields {
                diesel::sql_query(statement)
                    .bind::<Jsonb, _>(document)
                    .get_result::<InsertedIdRow>(connection)
            } else {
                diesel::sql_query(statement).get_result::<InsertedIdRow>(connection)
            }
            .map_err(|err| map_write_error(err, &name))?;
            Ok(inserted.id)
        })
        .await
    }

    async fn select_page(
        &self,
        relation: &RelationDefinition,
        page: PageRequest,
    ) -> TableStoreResult<Vec<StoredRecord>> {
        let name = relation.name().to_owned();
        let statement = ddl::select_page(relation);
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            ensure_exists(connection, &name)?;
            let rows = diesel::sql_query(statement)
                .bind::<BigInt, _>(limit)
                .bind::<BigInt, _>(offset)
                .load::<RecordRow>(connection)
                .map_err(TableStoreError::backend)?;
            Ok(rows
                .into_iter()
                .filter_map(|row| match row.record {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect())
        })
        .await
    }
}
