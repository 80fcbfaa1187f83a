//! Boundary scenarios with status classes.

use super::helpers::{ADMIN, Harness, harness, survey_request};
use rstest::rstest;
use serde_json::{Value, json};
use toolvault::gateway::GatewayError;

fn status<T>(result: Result<T, GatewayError>) -> u16 {
    result.map_or_else(|err| err.status(), |_| 200)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn survey_round_trip(harness: Harness) {
    let gateway = &harness.gateway;

    assert_eq!(
        status(gateway.register_tool(Some(ADMIN), survey_request()).await),
        200
    );
    assert_eq!(
        status(
            gateway
                .store_tool_data(
                    "survey",
                    Some("t1"),
                    &json!({"user_id": 101, "feedback": "Great service!"}),
                )
                .await
        ),
        200
    );

    let rows = gateway
        .get_tool_data("survey", None, None)
        .await
        .expect("read should succeed");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows.first().and_then(|row| row.get("user_id")),
        Some(&json!(101))
    );

    assert_eq!(
        status(
            gateway
                .store_tool_data(
                    "survey",
                    Some("t1"),
                    &json!({"user_id": "not-an-int", "feedback": "oops"}),
                )
                .await
        ),
        400
    );
    assert_eq!(
        status(gateway.delete_tool(Some(ADMIN), "survey").await),
        200
    );
    assert_eq!(status(gateway.get_tool_data("survey", None, None).await), 404);
}

#[rstest]
#[case(None)]
#[case(Some("not-the-admin"))]
#[tokio::test(flavor = "multi_thread")]
async fn admin_operations_require_the_admin_credential(
    harness: Harness,
    #[case] credential: Option<&str>,
) {
    let registered = harness
        .gateway
        .register_tool(credential, survey_request())
        .await;
    assert!(matches!(registered, Err(GatewayError::Forbidden(_))));

    harness
        .gateway
        .register_tool(Some(ADMIN), survey_request())
        .await
        .expect("admin registration should succeed");
    assert_eq!(
        status(harness.gateway.delete_tool(credential, "survey").await),
        403
    );
    harness
        .gateway
        .describe_tool("survey")
        .await
        .expect("tool should survive a forbidden delete");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registration_is_a_client_error(harness: Harness) {
    harness
        .gateway
        .register_tool(Some(ADMIN), survey_request())
        .await
        .expect("first registration should succeed");

    let second = harness
        .gateway
        .register_tool(Some(ADMIN), survey_request())
        .await;

    assert!(matches!(second, Err(GatewayError::Conflict(_))));
    assert_eq!(status(second), 400);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_tools_are_not_found(harness: Harness) {
    assert_eq!(
        status(
            harness
                .gateway
                .store_tool_data("ghost", Some("t1"), &json!({}))
                .await
        ),
        404
    );
    assert_eq!(
        status(harness.gateway.delete_tool(Some(ADMIN), "ghost").await),
        404
    );
    assert_eq!(
        status(harness.gateway.get_tool_data("bad name!", None, None).await),
        404
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn wrong_tool_token_is_unauthorized(harness: Harness) {
    harness
        .gateway
        .register_tool(Some(ADMIN), survey_request())
        .await
        .expect("registration should succeed");

    let result = harness
        .gateway
        .store_tool_data("survey", Some("t2"), &json!({"user_id": 1}))
        .await;
    assert_eq!(status(result), 401);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn store_failures_are_server_errors(harness: Harness) {
    harness
        .tables
        .fail_creates(Some("disk full".to_owned()))
        .expect("failure hook should install");

    let result = harness
        .gateway
        .register_tool(Some(ADMIN), survey_request())
        .await;

    let body = result.map_or_else(|err| err.to_json(), |_| Value::Null);
    assert_eq!(body.get("status"), Some(&json!(500)));
    assert_eq!(body.get("error"), Some(&json!("StoreError")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_reflects_registry_availability(harness: Harness) {
    harness
        .gateway
        .health()
        .await
        .expect("healthy registry should report ready");

    harness
        .registry
        .set_unavailable(Some("connection refused".to_owned()))
        .expect("failure hook should install");
    assert_eq!(status(harness.gateway.health().await), 500);
}
