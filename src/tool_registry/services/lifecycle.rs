//! Service layer for tool lifecycle orchestration.
//!
//! The registry row and the tool's relation must exist together. Creation
//! provisions the relation first and commits the registry row last, so a
//! failure can at worst leave an unreachable relation behind, never a row
//! pointing at nothing.

use crate::auth::{AccessError, CredentialVerifier};
use crate::tool_registry::{
    domain::{
        PageRequest, PaginationLimits, PayloadValidationError, RelationDefinition, SchemaError,
        StoredRecord, TableSynthesizer, ToolLifecycleState, ToolName, ToolRecord,
        ToolRegistration, ToolRegistryDomainError, ToolSummary, validate_schema,
    },
    ports::{
        RelationCreation, TableStoreError, ToolRegistryError, ToolRegistryRepository,
        ToolTableStore,
    },
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for registering a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterToolRequest {
    /// Unique tool name.
    pub name: String,
    /// Token callers must present on writes.
    pub token: String,
    /// Proposed schema: a JSON array of `{name, type}` objects.
    pub schema: Value,
}

impl RegisterToolRequest {
    /// Creates a registration request.
    #[must_use]
    pub fn new(name: impl Into<String>, token: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
            schema,
        }
    }
}

/// What deregistration does when the relation cannot be dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeregistrationPolicy {
    /// Keep the registry row and report the failure.
    #[default]
    Strict,
    /// Log the failure and delete the registry row anyway, possibly leaving
    /// an unreachable relation behind.
    Lenient,
}

/// Service-level errors for tool lifecycle operations.
#[derive(Debug, Error)]
pub enum ToolLifecycleServiceError {
    /// Tool name or token validation failed.
    #[error(transparent)]
    Domain(#[from] ToolRegistryDomainError),
    /// The proposed schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The payload does not match the tool schema.
    #[error(transparent)]
    Validation(#[from] PayloadValidationError),
    /// A tool with the same name is already registered.
    #[error("tool '{0}' is already registered")]
    Conflict(ToolName),
    /// No tool is registered under the given name.
    #[error("tool '{0}' not found")]
    NotFound(String),
    /// The presented tool token was missing or did not match.
    #[error("invalid token for tool '{tool}': {reason}")]
    Unauthorized {
        /// Tool whose token was checked.
        tool: ToolName,
        /// Why the check failed.
        reason: AccessError,
    },
    /// Registry persistence failed.
    #[error(transparent)]
    Repository(#[from] ToolRegistryError),
    /// Table store operation failed.
    #[error(transparent)]
    TableStore(#[from] TableStoreError),
}

/// Result type for lifecycle service operations.
pub type ToolLifecycleServiceResult<T> = Result<T, ToolLifecycleServiceError>;

/// Tool lifecycle orchestration service.
pub struct ToolLifecycleService<R, T, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    store: Arc<T>,
    verifier: Arc<V>,
    clock: Arc<C>,
    synthesizer: TableSynthesizer,
    limits: PaginationLimits,
    policy: DeregistrationPolicy,
}

impl<R, T, V, C> Clone for ToolLifecycleService<R, T, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            store: Arc::clone(&self.store),
            verifier: Arc::clone(&self.verifier),
            clock: Arc::clone(&self.clock),
            synthesizer: self.synthesizer.clone(),
            limits: self.limits,
            policy: self.policy,
        }
    }
}

impl<R, T, V, C> ToolLifecycleService<R, T, V, C>
where
    R: ToolRegistryRepository,
    T: ToolTableStore,
    V: CredentialVerifier,
    C: Clock + Send + Sync,
{
    /// Creates a service with the default relation prefix, pagination limits
    /// and strict deregistration.
    #[must_use]
    pub fn new(repository: Arc<R>, store: Arc<T>, verifier: Arc<V>, clock: Arc<C>) -> Self {
        Self {
            repository,
            store,
            verifier,
            clock,
            synthesizer: TableSynthesizer::default(),
            limits: PaginationLimits::default(),
            policy: DeregistrationPolicy::default(),
        }
    }

    /// Replaces the table synthesizer.
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: TableSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Replaces the pagination limits.
    #[must_use]
    pub const fn with_pagination(mut self, limits: PaginationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the deregistration policy.
    #[must_use]
    pub const fn with_deregistration_policy(mut self, policy: DeregistrationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the relation definition for a registered tool.
    #[must_use]
    pub fn relation_for(&self, registration: &ToolRegistration) -> RelationDefinition {
        self.synthesizer
            .synthesize(registration.name(), registration.schema())
    }

    async fn resolve(&self, name: &str) -> ToolLifecycleServiceResult<ToolRegistration> {
        let Ok(tool_name) = ToolName::new(name) else {
            return Err(ToolLifecycleServiceError::NotFound(name.to_owned()));
        };
        self.repository
            .find_by_name(&tool_name)
            .await?
            .ok_or_else(|| ToolLifecycleServiceError::NotFound(tool_name.to_string()))
    }

    fn authorize(
        &self,
        registration: &ToolRegistration,
        presented: Option<&str>,
    ) -> ToolLifecycleServiceResult<()> {
        let token = presented.ok_or_else(|| ToolLifecycleServiceError::Unauthorized {
            tool: registration.name().clone(),
            reason: AccessError::Missing,
        })?;
        if self.verifier.verify(token, registration.sealed_token()) {
            return Ok(());
        }
        Err(ToolLifecycleServiceError::Unauthorized {
            tool: registration.name().clone(),
            reason: AccessError::Rejected,
        })
    }

    /// Registers a tool and provisions its relation.
    ///
    /// # Errors
    ///
    /// Returns domain or schema errors for invalid input,
    /// [`ToolLifecycleServiceError::Conflict`] when the name is taken,
    /// [`TableStoreError::Orphaned`] when an unregistered relation already
    /// holds the name, and table store or repository errors when
    /// provisioning fails. No registry row exists after a failed call.
    pub async fn register(
        &self,
        request: RegisterToolRequest,
    ) -> ToolLifecycleServiceResult<ToolRegistration> {
        let mut state =
            ToolLifecycleState::Unregistered.transition_to(ToolLifecycleState::Registering)?;
        let tool_name = ToolName::new(request.name)?;
        if request.token.trim().is_empty() {
            return Err(ToolRegistryDomainError::EmptyToken.into());
        }
        let schema = validate_schema(&request.schema)?;

        if self.repository.find_by_name(&tool_name).await?.is_some() {
            return Err(ToolLifecycleServiceError::Conflict(tool_name));
        }

        let relation = self.synthesizer.synthesize(&tool_name, &schema);
        let creation = self.store.create_if_absent(&relation).await?;
        if creation == RelationCreation::AlreadyPresent {
            return Err(self.refuse_existing_relation(tool_name, &relation).await);
        }

        let registration = ToolRegistration::new(
            tool_name,
            self.verifier.seal(&request.token),
            schema,
            &*self.clock,
        );
        if let Err(err) = self.repository.register(&registration).await {
            state = state.transition_to(ToolLifecycleState::Unregistered)?;
            debug!(tool = %registration.name(), state = %state, "registration aborted");
            return Err(self.abandon_registration(&registration, &relation, creation, err).await);
        }

        state = state.transition_to(ToolLifecycleState::Registered)?;
        info!(
            tool = %registration.name(),
            relation = relation.name(),
            fields = registration.schema().len(),
            state = %state,
            "tool registered"
        );
        Ok(registration)
    }

    /// An existing relation either belongs to a concurrent registrant that
    /// has since committed, or was orphaned and must not be handed over.
    async fn refuse_existing_relation(
        &self,
        tool_name: ToolName,
        relation: &RelationDefinition,
    ) -> ToolLifecycleServiceError {
        match self.repository.find_by_name(&tool_name).await {
            Ok(Some(_)) => ToolLifecycleServiceError::Conflict(tool_name),
            Ok(None) => {
                warn!(
                    tool = %tool_name,
                    relation = relation.name(),
                    "refusing registration over an orphaned relation"
                );
                TableStoreError::Orphaned(relation.name().to_owned()).into()
            }
            Err(err) => err.into(),
        }
    }

    async fn abandon_registration(
        &self,
        registration: &ToolRegistration,
        relation: &RelationDefinition,
        creation: RelationCreation,
        err: ToolRegistryError,
    ) -> ToolLifecycleServiceError {
        match err {
            ToolRegistryError::DuplicateToolName(name) => ToolLifecycleServiceError::Conflict(name),
            other => {
                if creation == RelationCreation::Created {
                    warn!(
                        tool = %registration.name(),
                        relation = relation.name(),
                        "registry insert failed, dropping freshly created relation"
                    );
                    if let Err(drop_err) = self.store.drop_if_exists(relation).await {
                        warn!(
                            relation = relation.name(),
                            error = %drop_err,
                            "compensating drop failed"
                        );
                    }
                }
                other.into()
            }
        }
    }

    /// Validates a payload and appends it to the tool's relation.
    ///
    /// Keys absent from the schema are dropped before insertion.
    ///
    /// # Errors
    ///
    /// Returns [`ToolLifecycleServiceError::NotFound`] for unknown tools,
    /// [`ToolLifecycleServiceError::Unauthorized`] for a missing or wrong
    /// token, validation errors for mismatched payloads and table store
    /// errors when the insert fails.
    pub async fn store_record(
        &self,
        name: &str,
        presented_token: Option<&str>,
        payload: &Value,
    ) -> ToolLifecycleServiceResult<i64> {
        let registration = self.resolve(name).await?;
        self.authorize(&registration, presented_token)?;
        let record = ToolRecord::from_payload(payload, registration.schema())?;
        let relation = self.relation_for(&registration);

        let id = self
            .store
            .insert(&relation, &record)
            .await
            .map_err(|err| missing_relation_as_not_found(err, &registration))?;
        debug!(tool = %registration.name(), id, "record stored");
        Ok(id)
    }

    /// Reads one page of a tool's records in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ToolLifecycleServiceError::NotFound`] for unknown tools and
    /// table store errors when the scan fails.
    pub async fn read_records(
        &self,
        name: &str,
        limit: Option<u32>,
        offset: Option<u64>,
    ) -> ToolLifecycleServiceResult<Vec<StoredRecord>> {
        let registration = self.resolve(name).await?;
        let page = PageRequest::resolve(limit, offset, self.limits);
        let relation = self.relation_for(&registration);

        let records = self
            .store
            .select_page(&relation, page)
            .await
            .map_err(|err| missing_relation_as_not_found(err, &registration))?;
        debug!(
            tool = %registration.name(),
            limit = page.limit(),
            offset = page.offset(),
            returned = records.len(),
            "records read"
        );
        Ok(records)
    }

    /// Drops a tool's relation and deletes its registry row.
    ///
    /// # Errors
    ///
    /// Returns [`ToolLifecycleServiceError::NotFound`] for unknown tools. Under
    /// [`DeregistrationPolicy::Strict`] a failed drop is returned and the
    /// tool stays registered.
    pub async fn deregister(&self, name: &str) -> ToolLifecycleServiceResult<()> {
        let registration = self.resolve(name).await?;
        let mut state =
            ToolLifecycleState::Registered.transition_to(ToolLifecycleState::Deregistering)?;
        let relation = self.relation_for(&registration);

        if let Err(err) = self.store.drop_if_exists(&relation).await {
            match self.policy {
                DeregistrationPolicy::Strict => {
                    state = state.transition_to(ToolLifecycleState::Registered)?;
                    warn!(
                        tool = %registration.name(),
                        error = %err,
                        state = %state,
                        "relation drop failed, tool stays registered"
                    );
                    return Err(err.into());
                }
                DeregistrationPolicy::Lenient => warn!(
                    tool = %registration.name(),
                    relation = relation.name(),
                    error = %err,
                    "relation drop failed, deleting registry row anyway"
                ),
            }
        }

        self.repository
            .deregister(registration.name())
            .await
            .map_err(|err| match err {
                ToolRegistryError::NotFound(missing) => {
                    ToolLifecycleServiceError::NotFound(missing.to_string())
                }
                other => other.into(),
            })?;
        state = state.transition_to(ToolLifecycleState::Unregistered)?;
        info!(tool = %registration.name(), state = %state, "tool deregistered");
        Ok(())
    }

    /// Returns the token-free view of one registered tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolLifecycleServiceError::NotFound`] for unknown tools.
    pub async fn describe(&self, name: &str) -> ToolLifecycleServiceResult<ToolSummary> {
        Ok(self.resolve(name).await?.summary())
    }

    /// Finds a registered tool by exact name.
    ///
    /// # Errors
    ///
    /// Returns domain validation errors when the name is invalid and
    /// persistence errors from the repository.
    pub async fn find_by_name(
        &self,
        name: &str,
    ) -> ToolLifecycleServiceResult<Option<ToolRegistration>> {
        let tool_name = ToolName::new(name)?;
        Ok(self.repository.find_by_name(&tool_name).await?)
    }

    /// Lists every registered tool ordered by name.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn list_all(&self) -> ToolLifecycleServiceResult<Vec<ToolSummary>> {
        let registrations = self.repository.list_all().await?;
        Ok(registrations.iter().map(ToolRegistration::summary).collect())
    }

    /// Checks that the registry store is reachable.
    ///
    /// # Errors
    ///
    /// Returns persistence-layer errors from the repository.
    pub async fn health(&self) -> ToolLifecycleServiceResult<()> {
        Ok(self.repository.ping().await?)
    }
}

/// A relation that vanished under a registered tool means the tool is being
/// deregistered concurrently.
fn missing_relation_as_not_found(
    err: TableStoreError,
    registration: &ToolRegistration,
) -> ToolLifecycleServiceError {
    match err {
        TableStoreError::MissingRelation(_) => {
            ToolLifecycleServiceError::NotFound(registration.name().to_string())
        }
        other => other.into(),
    }
}
