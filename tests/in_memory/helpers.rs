//! Shared fixtures for in-memory integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use serde_json::{Value, json};
use std::sync::Arc;
use toolvault::auth::{AdminGate, PlainTextVerifier, TokenSet};
use toolvault::common_record::{
    adapters::memory::InMemoryCommonRecordStore, services::CommonRecordService,
};
use toolvault::gateway::ToolGateway;
use toolvault::tool_registry::{
    adapters::memory::{InMemoryToolRegistry, InMemoryToolTableStore},
    services::{DeregistrationPolicy, RegisterToolRequest, ToolLifecycleService},
};

/// Admin credential accepted by the harness.
pub const ADMIN: &str = "admin-secret-123";

/// Tokens accepted for sensitive common records.
pub const COMMON_TOKENS: [&str; 2] = ["token123", "token456"];

/// Lifecycle service wired to in-memory adapters.
pub type MemoryLifecycle = ToolLifecycleService<
    InMemoryToolRegistry,
    InMemoryToolTableStore<DefaultClock>,
    PlainTextVerifier,
    DefaultClock,
>;

/// Gateway wired to in-memory adapters.
pub type MemoryGateway = ToolGateway<
    InMemoryToolRegistry,
    InMemoryToolTableStore<DefaultClock>,
    InMemoryCommonRecordStore,
    PlainTextVerifier,
    DefaultClock,
>;

/// Gateway plus handles on its stores for inspection and failure injection.
pub struct Harness {
    /// Registry backing the gateway.
    pub registry: Arc<InMemoryToolRegistry>,
    /// Per-tool relations backing the gateway.
    pub tables: Arc<InMemoryToolTableStore<DefaultClock>>,
    /// Shared common-record relation.
    pub common: Arc<InMemoryCommonRecordStore>,
    /// Lifecycle service sharing the same stores.
    pub lifecycle: MemoryLifecycle,
    /// Gateway under test.
    pub gateway: MemoryGateway,
}

impl Harness {
    /// Builds a harness with the given deregistration policy.
    pub fn with_policy(policy: DeregistrationPolicy) -> Self {
        let registry = Arc::new(InMemoryToolRegistry::new());
        let tables = Arc::new(InMemoryToolTableStore::new(DefaultClock));
        let common = Arc::new(InMemoryCommonRecordStore::new());
        let verifier = Arc::new(PlainTextVerifier);
        let clock = Arc::new(DefaultClock);

        let lifecycle = ToolLifecycleService::new(
            Arc::clone(&registry),
            Arc::clone(&tables),
            Arc::clone(&verifier),
            Arc::clone(&clock),
        )
        .with_deregistration_policy(policy);
        let common_service = CommonRecordService::new(
            Arc::clone(&common),
            TokenSet::new(
                Arc::clone(&verifier),
                COMMON_TOKENS.iter().map(|token| (*token).to_owned()).collect(),
            ),
            clock,
        );
        let gateway = ToolGateway::new(
            AdminGate::new(verifier, Some(ADMIN.to_owned())),
            lifecycle.clone(),
            common_service,
        );

        Self {
            registry,
            tables,
            common,
            lifecycle,
            gateway,
        }
    }
}

/// Provides a harness that keeps tools registered when a drop fails.
#[fixture]
pub fn harness() -> Harness {
    Harness::with_policy(DeregistrationPolicy::Strict)
}

/// Schema of the survey tool used across scenarios.
pub fn survey_schema() -> Value {
    json!([
        {"name": "user_id", "type": "int"},
        {"name": "feedback", "type": "str"}
    ])
}

/// Registration request for the survey tool with token `t1`.
pub fn survey_request() -> RegisterToolRequest {
    RegisterToolRequest::new("survey", "t1", survey_schema())
}
