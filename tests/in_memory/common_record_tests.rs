//! In-memory integration tests for the common-record path.

use super::helpers::{COMMON_TOKENS, Harness, harness};
use rstest::rstest;
use serde_json::json;
use toolvault::common_record::domain::Sensitivity;
use toolvault::gateway::GatewayError;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sensitive_record_without_token_is_unauthorized(harness: Harness) {
    let result = harness
        .gateway
        .store_common_record("reports_tool", 1, None, json!({"rows": 3}))
        .await;

    assert!(matches!(result, Err(GatewayError::Unauthorized(_))));
    assert_eq!(result.map_err(|err| err.status()).err(), Some(401));
    assert!(harness.common.all().expect("probe should succeed").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sensitive_record_with_token_is_appended(harness: Harness) {
    let stored = harness
        .gateway
        .store_common_record(
            "reports_tool",
            1,
            COMMON_TOKENS.first().copied(),
            json!({"rows": 3}),
        )
        .await
        .expect("store should succeed");

    assert_eq!(stored.sensitive, Sensitivity::Sensitive);
    let all = harness.common.all().expect("probe should succeed");
    assert_eq!(all, vec![stored]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn public_records_need_no_token(harness: Harness) {
    harness
        .gateway
        .store_common_record("reports_tool", 0, None, json!({"rows": 1}))
        .await
        .expect("public store should succeed");
    harness
        .gateway
        .store_common_record("reports_tool", 0, Some("not-a-token"), json!({"rows": 2}))
        .await
        .expect("token is ignored for public records");

    assert_eq!(harness.common.all().expect("probe should succeed").len(), 2);
}

#[rstest]
#[case(2, json!({"rows": 1}))]
#[case(0, json!("not an object"))]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_common_records_are_rejected(
    harness: Harness,
    #[case] sensitive: i64,
    #[case] data: serde_json::Value,
) {
    let result = harness
        .gateway
        .store_common_record("reports_tool", sensitive, None, data)
        .await;
    assert!(matches!(result, Err(GatewayError::Validation(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn common_records_are_independent_of_the_registry(harness: Harness) {
    harness
        .gateway
        .store_common_record("survey", 0, None, json!({"note": "unregistered"}))
        .await
        .expect("store should succeed");

    assert!(matches!(
        harness.gateway.describe_tool("survey").await,
        Err(GatewayError::NotFound(_))
    ));
    assert!(
        !harness
            .tables
            .contains_relation("tool_survey")
            .expect("probe should succeed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listing_filters_by_tool_and_paginates(harness: Harness) {
    for index in 0..15 {
        harness
            .gateway
            .store_common_record("reports_tool", 0, None, json!({"index": index}))
            .await
            .expect("store should succeed");
    }
    harness
        .gateway
        .store_common_record("other_tool", 0, None, json!({"index": 99}))
        .await
        .expect("store should succeed");

    let first_page = harness
        .gateway
        .list_common_records("reports_tool", None, None)
        .await
        .expect("list should succeed");
    assert_eq!(first_page.len(), 10);
    assert!(
        first_page
            .iter()
            .all(|record| record.tool_name.as_str() == "reports_tool")
    );

    let rest = harness
        .gateway
        .list_common_records("reports_tool", Some(50), Some(10))
        .await
        .expect("list should succeed");
    assert_eq!(rest.len(), 5);
}
