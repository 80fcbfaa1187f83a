//! `PostgreSQL` integration tests for the common-record store.

use mockable::DefaultClock;
use serde_json::json;
use std::sync::Arc;
use toolvault::auth::{PlainTextVerifier, TokenSet};
use toolvault::common_record::{
    adapters::postgres::PostgresCommonRecordStore, domain::Sensitivity,
    services::CommonRecordService,
};

use crate::postgres::helpers::{BoxError, test_pool, unique_name};

#[tokio::test(flavor = "multi_thread")]
async fn records_are_appended_and_listed_per_tool() -> Result<(), BoxError> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let service = CommonRecordService::new(
        Arc::new(PostgresCommonRecordStore::new(pool)),
        TokenSet::new(Arc::new(PlainTextVerifier), vec!["token123".to_owned()]),
        Arc::new(DefaultClock),
    );
    let tool = unique_name("reports");

    let stored = service
        .store(&tool, 1, Some("token123"), json!({"rows": 3}))
        .await?;
    service.store(&tool, 0, None, json!({"rows": 4})).await?;

    assert_eq!(stored.sensitive, Sensitivity::Sensitive);
    let listed = service.list(&tool, None, None).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed.first().map(|record| record.id), Some(stored.id));
    assert_eq!(
        listed.get(1).map(|record| record.data.clone()),
        Some(json!({"rows": 4}))
    );
    Ok(())
}
