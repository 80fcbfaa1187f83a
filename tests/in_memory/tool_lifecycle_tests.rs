//! In-memory integration tests for the tool lifecycle.

use super::helpers::{Harness, harness, survey_request};
use rstest::rstest;
use serde_json::{Value, json};
use toolvault::auth::AccessError;
use toolvault::tool_registry::{
    domain::{PayloadValidationError, SchemaError, ToolName},
    ports::{TableStoreError, ToolRegistryRepository, ToolTableStore},
    services::{DeregistrationPolicy, RegisterToolRequest, ToolLifecycleServiceError},
};

async fn register_survey(harness: &Harness) {
    harness
        .lifecycle
        .register(survey_request())
        .await
        .expect("survey registration should succeed");
}

async fn store_feedback(harness: &Harness, user_id: i64) -> i64 {
    harness
        .lifecycle
        .store_record(
            "survey",
            Some("t1"),
            &json!({"user_id": user_id, "feedback": format!("entry {user_id}")}),
        )
        .await
        .expect("store should succeed")
}

fn survey_name() -> ToolName {
    ToolName::new("survey").expect("valid tool name")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registration_provisions_relation_and_row(harness: Harness) {
    register_survey(&harness).await;

    assert!(
        harness
            .tables
            .contains_relation("tool_survey")
            .expect("probe should succeed")
    );
    let stored = harness
        .registry
        .find_by_name(&survey_name())
        .await
        .expect("lookup should succeed")
        .expect("registration should exist");
    assert_eq!(stored.schema().len(), 2);
    assert_ne!(stored.sealed_token(), "", "token should be persisted");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_relation_creation_leaves_no_registry_row(harness: Harness) {
    harness
        .tables
        .fail_creates(Some("disk full".to_owned()))
        .expect("failure hook should install");

    let result = harness.lifecycle.register(survey_request()).await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::TableStore(_))
    ));
    assert!(
        harness
            .registry
            .find_by_name(&survey_name())
            .await
            .expect("lookup should succeed")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_keeps_the_original(harness: Harness) {
    let first = harness
        .lifecycle
        .register(RegisterToolRequest::new(
            "dup",
            "first-token",
            json!([{"name": "score", "type": "int"}]),
        ))
        .await
        .expect("first registration should succeed");
    harness
        .lifecycle
        .store_record("dup", Some("first-token"), &json!({"score": 7}))
        .await
        .expect("store should succeed");

    let second = harness
        .lifecycle
        .register(RegisterToolRequest::new(
            "dup",
            "second-token",
            json!([{"name": "comment", "type": "str"}]),
        ))
        .await;

    assert!(matches!(
        second,
        Err(ToolLifecycleServiceError::Conflict(name)) if name.as_str() == "dup"
    ));
    let summary = harness
        .lifecycle
        .describe("dup")
        .await
        .expect("original registration should remain");
    assert_eq!(summary, first.summary());
    assert_eq!(
        harness.tables.row_count("tool_dup").expect("probe should succeed"),
        Some(1)
    );
    harness
        .lifecycle
        .store_record("dup", Some("first-token"), &json!({"score": 8}))
        .await
        .expect("original token should still be accepted");
}

#[rstest]
#[case(json!({"type": "int"}))]
#[case(json!([{"name": "score", "type": "decimal"}]))]
#[case(json!([{"name": "score", "type": "int", "nullable": true}]))]
#[case(json!([{"name": "score", "type": "int"}, {"name": "score", "type": "str"}]))]
#[case(json!([{"name": "id", "type": "int"}]))]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_schemas_are_rejected_before_any_mutation(
    harness: Harness,
    #[case] schema: Value,
) {
    let result = harness
        .lifecycle
        .register(RegisterToolRequest::new("survey", "t1", schema))
        .await;

    assert!(matches!(result, Err(ToolLifecycleServiceError::Schema(_))));
    assert!(
        !harness
            .tables
            .contains_relation("tool_survey")
            .expect("probe should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsupported_type_lists_allowed_tags(harness: Harness) {
    let result = harness
        .lifecycle
        .register(RegisterToolRequest::new(
            "survey",
            "t1",
            json!([{"name": "score", "type": "DECIMAL"}]),
        ))
        .await;

    let Err(ToolLifecycleServiceError::Schema(SchemaError::UnsupportedType { type_tag, allowed })) =
        result
    else {
        panic!("expected unsupported type error, got {result:?}");
    };
    assert_eq!(type_tag, "decimal");
    assert!(allowed.contains(&"timestamp"));
}

#[rstest]
#[case("")]
#[case("bad name!")]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_tool_names_are_rejected(harness: Harness, #[case] name: &str) {
    let result = harness
        .lifecycle
        .register(RegisterToolRequest::new(name, "t1", json!([])))
        .await;
    assert!(matches!(result, Err(ToolLifecycleServiceError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn booleans_never_satisfy_integer_fields(harness: Harness) {
    register_survey(&harness).await;

    let result = harness
        .lifecycle
        .store_record("survey", Some("t1"), &json!({"user_id": true}))
        .await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::Validation(PayloadValidationError::TypeMismatch {
            ref field,
            expected: "int",
            observed: "boolean",
        })) if field == "user_id"
    ));
    assert_eq!(
        harness.tables.row_count("tool_survey").expect("probe should succeed"),
        Some(0)
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_keys_are_dropped(harness: Harness) {
    register_survey(&harness).await;

    harness
        .lifecycle
        .store_record(
            "survey",
            Some("t1"),
            &json!({"user_id": 5, "feedback": "fine", "referrer": "newsletter"}),
        )
        .await
        .expect("store should succeed");

    let rows = harness
        .lifecycle
        .read_records("survey", None, None)
        .await
        .expect("read should succeed");
    let row = rows.first().expect("one row expected");
    assert_eq!(row.get("user_id"), Some(&json!(5)));
    assert!(!row.contains_key("referrer"));
}

#[rstest]
#[case(None, Some("t1"), AccessError::Missing)]
#[case(Some("t1"), Some("t2"), AccessError::Rejected)]
#[tokio::test(flavor = "multi_thread")]
async fn writes_require_the_registered_token(
    harness: Harness,
    #[case] presented: Option<&str>,
    #[case] registered: Option<&str>,
    #[case] expected: AccessError,
) {
    harness
        .lifecycle
        .register(RegisterToolRequest::new(
            "survey",
            registered.unwrap_or("t1"),
            json!([{"name": "user_id", "type": "int"}]),
        ))
        .await
        .expect("registration should succeed");

    let result = harness
        .lifecycle
        .store_record("survey", presented, &json!({"user_id": 1}))
        .await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::Unauthorized { reason, .. }) if reason == expected
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pagination_is_clamped_and_ordered(harness: Harness) {
    register_survey(&harness).await;
    for user_id in 1..=120 {
        store_feedback(&harness, user_id).await;
    }

    let default_page = harness
        .lifecycle
        .read_records("survey", None, None)
        .await
        .expect("read should succeed");
    assert_eq!(default_page.len(), 10);

    let oversized = harness
        .lifecycle
        .read_records("survey", Some(1000), None)
        .await
        .expect("read should succeed");
    assert_eq!(oversized.len(), 100);

    let second_page = harness
        .lifecycle
        .read_records("survey", Some(5), Some(10))
        .await
        .expect("read should succeed");
    let ids: Vec<Option<i64>> = second_page
        .iter()
        .map(|row| row.get("id").and_then(Value::as_i64))
        .collect();
    assert_eq!(ids, vec![Some(11), Some(12), Some(13), Some(14), Some(15)]);

    let past_end = harness
        .lifecycle
        .read_records("survey", None, Some(500))
        .await
        .expect("read past the end should succeed");
    assert!(past_end.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deregistration_removes_relation_and_row(harness: Harness) {
    register_survey(&harness).await;
    store_feedback(&harness, 1).await;

    harness
        .lifecycle
        .deregister("survey")
        .await
        .expect("deregistration should succeed");

    assert!(
        !harness
            .tables
            .contains_relation("tool_survey")
            .expect("probe should succeed")
    );
    assert!(matches!(
        harness.lifecycle.read_records("survey", None, None).await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
    assert!(matches!(
        harness.lifecycle.deregister("survey").await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strict_policy_keeps_tool_when_drop_fails(harness: Harness) {
    register_survey(&harness).await;
    harness
        .tables
        .fail_drops(Some("relation locked".to_owned()))
        .expect("failure hook should install");

    let result = harness.lifecycle.deregister("survey").await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::TableStore(_))
    ));
    harness
        .lifecycle
        .describe("survey")
        .await
        .expect("tool should stay registered");
}

#[tokio::test(flavor = "multi_thread")]
async fn lenient_policy_deletes_row_when_drop_fails() {
    let harness = Harness::with_policy(DeregistrationPolicy::Lenient);
    register_survey(&harness).await;
    harness
        .tables
        .fail_drops(Some("relation locked".to_owned()))
        .expect("failure hook should install");

    harness
        .lifecycle
        .deregister("survey")
        .await
        .expect("lenient deregistration should succeed");

    assert!(matches!(
        harness.lifecycle.describe("survey").await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
    assert!(
        harness
            .tables
            .contains_relation("tool_survey")
            .expect("probe should succeed"),
        "orphaned relation is left behind"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn write_to_a_vanished_relation_reports_not_found(harness: Harness) {
    let registration = harness
        .lifecycle
        .register(survey_request())
        .await
        .expect("registration should succeed");
    harness
        .tables
        .drop_if_exists(&harness.lifecycle.relation_for(&registration))
        .await
        .expect("drop should succeed");

    let result = harness
        .lifecycle
        .store_record("survey", Some("t1"), &json!({"user_id": 1}))
        .await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::NotFound(name)) if name == "survey"
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn orphaned_relation_is_never_handed_to_a_new_registrant() {
    let harness = Harness::with_policy(DeregistrationPolicy::Lenient);
    register_survey(&harness).await;
    store_feedback(&harness, 101).await;
    harness
        .tables
        .fail_drops(Some("relation locked".to_owned()))
        .expect("failure hook should install");
    harness
        .lifecycle
        .deregister("survey")
        .await
        .expect("lenient deregistration should succeed");

    let result = harness
        .lifecycle
        .register(RegisterToolRequest::new(
            "survey",
            "t2",
            json!([{"name": "score", "type": "int"}]),
        ))
        .await;

    assert!(matches!(
        result,
        Err(ToolLifecycleServiceError::TableStore(TableStoreError::Orphaned(relation)))
            if relation == "tool_survey"
    ));
    assert!(matches!(
        harness.lifecycle.read_records("survey", None, None).await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
    assert!(matches!(
        harness
            .lifecycle
            .store_record("survey", Some("t2"), &json!({"score": 5}))
            .await,
        Err(ToolLifecycleServiceError::NotFound(_))
    ));
    assert_eq!(
        harness
            .tables
            .row_count("tool_survey")
            .expect("probe should succeed"),
        Some(1),
        "orphaned rows stay where they were"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_is_sorted_and_token_free(harness: Harness) {
    for name in ["zeta", "alpha", "mid"] {
        harness
            .lifecycle
            .register(RegisterToolRequest::new(name, "secret-token", json!([])))
            .await
            .expect("registration should succeed");
    }

    let tools = harness.lifecycle.list_all().await.expect("list should succeed");
    let names: Vec<&str> = tools.iter().map(|tool| tool.tool_name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    let rendered = serde_json::to_string(&tools).expect("summaries serialize");
    assert!(!rendered.contains("secret-token"));
}
