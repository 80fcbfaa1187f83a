//! `PostgreSQL` store implementation for common records.

use super::{
    models::{CommonRecordRow, NewCommonRecordRow},
    schema::common_records,
};
use crate::common_record::{
    domain::{CommonRecord, CommonToolName, NewCommonRecord, Sensitivity},
    ports::{CommonRecordStore, CommonRecordStoreError, CommonRecordStoreResult},
};
use crate::tool_registry::{adapters::postgres::PgPool, domain::PageRequest};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

/// `PostgreSQL`-backed common record store.
#[derive(Debug, Clone)]
pub struct PostgresCommonRecordStore {
    pool: PgPool,
}

impl PostgresCommonRecordStore {
    /// Creates a new store from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> CommonRecordStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> CommonRecordStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(CommonRecordStoreError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(CommonRecordStoreError::persistence)?
    }
}

#[async_trait]
impl CommonRecordStore for PostgresCommonRecordStore {
    async fn append(&self, record: NewCommonRecord) -> CommonRecordStoreResult<CommonRecord> {
        let new_row = to_new_row(&record);
        self.run_blocking(move |connection| {
            let row = diesel::insert_into(common_records::table)
                .values(&new_row)
                .returning(CommonRecordRow::as_returning())
                .get_result::<CommonRecordRow>(connection)
                .map_err(CommonRecordStoreError::persistence)?;
            row_to_record(row)
        })
        .await
    }

    async fn list_by_tool(
        &self,
        tool_name: &CommonToolName,
        page: PageRequest,
    ) -> CommonRecordStoreResult<Vec<CommonRecord>> {
        let name = tool_name.as_str().to_owned();
        let limit = i64::from(page.limit());
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = common_records::table
                .filter(common_records::tool_name.eq(&name))
                .order(common_records::id.asc())
                .limit(limit)
                .offset(offset)
                .select(CommonRecordRow::as_select())
                .load::<CommonRecordRow>(connection)
                .map_err(CommonRecordStoreError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn to_new_row(record: &NewCommonRecord) -> NewCommonRecordRow {
    NewCommonRecordRow {
        tool_name: record.tool_name().as_str().to_owned(),
        data: serde_json::Value::Object(record.data().clone()),
        sensitive: record.sensitivity().as_flag(),
        created_at: record.created_at(),
    }
}

fn row_to_record(row: CommonRecordRow) -> CommonRecordStoreResult<CommonRecord> {
    let CommonRecordRow {
        id,
        tool_name,
        data,
        sensitive,
        created_at,
    } = row;

    Ok(CommonRecord {
        id,
        tool_name: CommonToolName::new(tool_name)
            .map_err(CommonRecordStoreError::invalid_persisted_data)?,
        data,
        sensitive: Sensitivity::try_from(i64::from(sensitive))
            .map_err(CommonRecordStoreError::invalid_persisted_data)?,
        created_at,
    })
}
