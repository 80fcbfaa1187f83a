//! Application services for tool lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    DeregistrationPolicy, RegisterToolRequest, ToolLifecycleService, ToolLifecycleServiceError,
    ToolLifecycleServiceResult,
};
