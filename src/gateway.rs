//! Transport-neutral boundary operations.
//!
//! [`ToolGateway`] puts credential checks in front of the lifecycle and
//! common-record services and folds their errors into [`GatewayError`],
//! whose [`GatewayError::status`] is the status class a transport should
//! report.

use crate::auth::{AccessError, AdminGate, CredentialVerifier};
use crate::common_record::{
    domain::CommonRecord,
    ports::CommonRecordStore,
    services::{CommonRecordService, CommonRecordServiceError},
};
use crate::tool_registry::{
    domain::{StoredRecord, ToolSummary},
    ports::{ToolRegistryError, ToolRegistryRepository, ToolTableStore},
    services::{RegisterToolRequest, ToolLifecycleService, ToolLifecycleServiceError},
};
use mockable::Clock;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;

/// Boundary error with a fixed status class.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The proposed schema or tool name is malformed (400).
    #[error("schema error: {0}")]
    Schema(String),
    /// The payload does not match the schema (400).
    #[error("validation error: {0}")]
    Validation(String),
    /// The tool name is already registered (400).
    #[error("conflict: {0}")]
    Conflict(String),
    /// A tool or common-record token is missing or wrong (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The admin credential is missing or wrong (403).
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// No such tool (404).
    #[error("not found: {0}")]
    NotFound(String),
    /// The store failed (500).
    #[error("store error: {0}")]
    Store(String),
}

impl GatewayError {
    /// Returns the status class for this error.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Schema(_) | Self::Validation(_) | Self::Conflict(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Store(_) => 500,
        }
    }

    /// Returns the error kind name.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "SchemaError",
            Self::Validation(_) => "ValidationError",
            Self::Conflict(_) => "Conflict",
            Self::Unauthorized(_) => "Unauthorized",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "NotFound",
            Self::Store(_) => "StoreError",
        }
    }

    /// Returns a JSON body describing the error.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "status": self.status(),
            "error": self.kind(),
            "detail": self.to_string(),
        })
    }
}

impl From<ToolLifecycleServiceError> for GatewayError {
    fn from(err: ToolLifecycleServiceError) -> Self {
        match err {
            ToolLifecycleServiceError::Domain(_) | ToolLifecycleServiceError::Schema(_) => {
                Self::Schema(err.to_string())
            }
            ToolLifecycleServiceError::Validation(_) => Self::Validation(err.to_string()),
            ToolLifecycleServiceError::Conflict(name) => {
                Self::Conflict(format!("tool '{name}' already exists"))
            }
            ToolLifecycleServiceError::Repository(ToolRegistryError::DuplicateToolName(name)) => {
                Self::Conflict(format!("tool '{name}' already exists"))
            }
            ToolLifecycleServiceError::NotFound(name) => {
                Self::NotFound(format!("tool '{name}'"))
            }
            ToolLifecycleServiceError::Unauthorized { .. } => Self::Unauthorized(err.to_string()),
            ToolLifecycleServiceError::Repository(_) | ToolLifecycleServiceError::TableStore(_) => {
                warn!(error = %err, "store failure");
                Self::Store(err.to_string())
            }
        }
    }
}

impl From<CommonRecordServiceError> for GatewayError {
    fn from(err: CommonRecordServiceError) -> Self {
        match err {
            CommonRecordServiceError::Domain(_) => Self::Validation(err.to_string()),
            CommonRecordServiceError::Unauthorized(_) => Self::Unauthorized(err.to_string()),
            CommonRecordServiceError::Store(_) => {
                warn!(error = %err, "common record store failure");
                Self::Store(err.to_string())
            }
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Acknowledgement returned by successful writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoredAck {
    /// Identifier assigned to the stored record.
    pub id: i64,
}

/// Readiness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Human-readable status line.
    pub status: &'static str,
}

/// Boundary facade over the tool registry and the common-record path.
pub struct ToolGateway<R, T, S, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    admin: AdminGate<V>,
    tools: ToolLifecycleService<R, T, V, C>,
    common: CommonRecordService<S, V, C>,
}

impl<R, T, S, V, C> Clone for ToolGateway<R, T, S, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            admin: self.admin.clone(),
            tools: self.tools.clone(),
            common: self.common.clone(),
        }
    }
}

impl<R, T, S, V, C> ToolGateway<R, T, S, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    S: CommonRecordStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    /// Creates a gateway.
    #[must_use]
    pub const fn new(
        admin: AdminGate<V>,
        tools: ToolLifecycleService<R, T, V, C>,
        common: CommonRecordService<S, V, C>,
    ) -> Self {
        Self {
            admin,
            tools,
            common,
        }
    }

    fn require_admin(&self, credential: Option<&str>) -> GatewayResult<()> {
        self.admin.authorize(credential).map_err(|err| {
            let reason = match err {
                AccessError::Missing => "admin credential missing",
                AccessError::Rejected => "invalid admin credential",
            };
            GatewayError::Forbidden(reason.to_owned())
        })
    }

    /// Registers a tool. Requires the admin credential.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `SchemaError`, `Conflict` or `StoreError`.
    pub async fn register_tool(
        &self,
        admin_credential: Option<&str>,
        request: RegisterToolRequest,
    ) -> GatewayResult<ToolSummary> {
        self.require_admin(admin_credential)?;
        let registration = self.tools.register(request).await?;
        Ok(registration.summary())
    }

    /// Validates and stores one record for a tool.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Unauthorized`, `ValidationError` or `StoreError`.
    pub async fn store_tool_data(
        &self,
        name: &str,
        token: Option<&str>,
        payload: &Value,
    ) -> GatewayResult<StoredAck> {
        let id = self.tools.store_record(name, token, payload).await?;
        Ok(StoredAck { id })
    }

    /// Reads one page of a tool's records.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `StoreError`.
    pub async fn get_tool_data(
        &self,
        name: &str,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> GatewayResult<Vec<StoredRecord>> {
        Ok(self.tools.read_records(name, limit, offset).await?)
    }

    /// Deregisters a tool and drops its data. Requires the admin credential.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden`, `NotFound` or `StoreError`.
    pub async fn delete_tool(
        &self,
        admin_credential: Option<&str>,
        name: &str,
    ) -> GatewayResult<()> {
        self.require_admin(admin_credential)?;
        Ok(self.tools.deregister(name).await?)
    }

    /// Appends a record to the shared common-record relation.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for sensitive records without a valid token,
    /// `ValidationError` for bad input and `StoreError`.
    pub async fn store_common_record(
        &self,
        tool_name: &str,
        sensitive: i64,
        token: Option<&str>,
        data: Value,
    ) -> GatewayResult<CommonRecord> {
        Ok(self.common.store(tool_name, sensitive, token, data).await?)
    }

    /// Lists one page of common records for a tool name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a bad name and `StoreError`.
    pub async fn list_common_records(
        &self,
        tool_name: &str,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> GatewayResult<Vec<CommonRecord>> {
        Ok(self.common.list(tool_name, limit, offset).await?)
    }

    /// Lists every registered tool without tokens.
    ///
    /// # Errors
    ///
    /// Returns `StoreError`.
    pub async fn list_tools(&self) -> GatewayResult<Vec<ToolSummary>> {
        Ok(self.tools.list_all().await?)
    }

    /// Describes one registered tool without its token.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `StoreError`.
    pub async fn describe_tool(&self, name: &str) -> GatewayResult<ToolSummary> {
        Ok(self.tools.describe(name).await?)
    }

    /// Touches the store and reports readiness.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the store is unreachable.
    pub async fn health(&self) -> GatewayResult<HealthReport> {
        self.tools.health().await?;
        Ok(HealthReport {
            status: "storage service + db connected",
        })
    }
}
