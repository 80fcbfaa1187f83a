//! `PostgreSQL` integration tests for the tool lifecycle.

use serde_json::{Value, json};
use toolvault::tool_registry::services::{RegisterToolRequest, ToolLifecycleServiceError};

use crate::postgres::helpers::{BoxError, lifecycle, test_pool, unique_name};

fn typed_schema() -> Value {
    json!([
        {"name": "user_id", "type": "int"},
        {"name": "feedback", "type": "str"},
        {"name": "active", "type": "bool"},
        {"name": "meta", "type": "json"},
        {"name": "score", "type": "float"},
        {"name": "seen_at", "type": "timestamp"}
    ])
}

#[tokio::test(flavor = "multi_thread")]
async fn typed_record_round_trip() -> Result<(), BoxError> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let service = lifecycle(&pool);
    let name = unique_name("typed");

    service
        .register(RegisterToolRequest::new(&name, "t1", typed_schema()))
        .await?;
    service
        .store_record(
            &name,
            Some("t1"),
            &json!({
                "user_id": 101,
                "feedback": "Great service!",
                "active": true,
                "meta": {"source": "web"},
                "score": 4.5,
                "seen_at": "2026-10-01T12:00:00Z",
                "ignored": "dropped"
            }),
        )
        .await?;
    service
        .store_record(&name, Some("t1"), &json!({"user_id": 102}))
        .await?;

    let rows = service.read_records(&name, None, None).await?;
    assert_eq!(rows.len(), 2);
    let first = rows.first().ok_or("first row expected")?;
    assert_eq!(first.get("user_id"), Some(&json!(101)));
    assert_eq!(first.get("active"), Some(&json!(true)));
    assert_eq!(first.get("meta"), Some(&json!({"source": "web"})));
    assert!(first.get("created_at").is_some_and(Value::is_string));
    assert!(!first.contains_key("ignored"));
    let second = rows.get(1).ok_or("second row expected")?;
    assert_eq!(second.get("feedback"), Some(&Value::Null));

    let page = service.read_records(&name, Some(1), Some(1)).await?;
    assert_eq!(
        page.first().and_then(|row| row.get("user_id")),
        Some(&json!(102))
    );
    assert!(service.read_records(&name, None, Some(50)).await?.is_empty());

    service.deregister(&name).await?;
    assert!(matches!(
        service.read_records(&name, None, None).await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn store_refuses_unparseable_pass_through_values() -> Result<(), BoxError> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let service = lifecycle(&pool);
    let name = unique_name("stamps");
    service
        .register(RegisterToolRequest::new(
            &name,
            "t1",
            json!([{"name": "seen_at", "type": "timestamp"}]),
        ))
        .await?;

    let result = service
        .store_record(&name, Some("t1"), &json!({"seen_at": "yesterday-ish"}))
        .await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::TableStore(_))
    ));
    service.deregister(&name).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_duplicates_leave_one_registration() -> Result<(), BoxError> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let service = lifecycle(&pool);
    let name = unique_name("race");
    let schema = json!([{"name": "score", "type": "int"}]);

    let (left, right) = tokio::join!(
        service.register(RegisterToolRequest::new(&name, "left", schema.clone())),
        service.register(RegisterToolRequest::new(&name, "right", schema.clone())),
    );

    assert_eq!(
        usize::from(left.is_ok()) + usize::from(right.is_ok()),
        1,
        "exactly one registration should win: {left:?} / {right:?}"
    );
    assert!(service.find_by_name(&name).await?.is_some());
    service.deregister(&name).await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_is_a_conflict() -> Result<(), BoxError> {
    let Some(pool) = test_pool().await? else {
        return Ok(());
    };
    let service = lifecycle(&pool);
    let name = unique_name("dup");
    let schema = json!([{"name": "score", "type": "int"}]);

    let first = service
        .register(RegisterToolRequest::new(&name, "t1", schema.clone()))
        .await?;
    let second = service
        .register(RegisterToolRequest::new(&name, "t2", schema))
        .await;

    assert!(matches!(
        second,
        Err(ToolLifecycleServiceError::Conflict(_))
    ));
    assert_eq!(service.describe(&name).await?, first.summary());
    service.deregister(&name).await?;
    Ok(())
}
