//! `PostgreSQL` repository implementation for tool registrations.

use super::{
    PgPool,
    models::{NewToolRegistrationRow, ToolRegistrationRow},
    schema::tool_registrations,
};
use crate::tool_registry::{
    domain::{PersistedToolData, ToolId, ToolName, ToolRegistration, ToolSchema},
    ports::{ToolRegistryError, ToolRegistryRepository, ToolRegistryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::warn;

/// Unique constraint guarding tool names.
const NAME_UNIQUE_CONSTRAINT: &str = "tool_registrations_name_key";

/// `PostgreSQL`-backed repository for tool registrations.
#[derive(Debug, Clone)]
pub struct PostgresToolRegistry {
    pool: PgPool,
}

impl PostgresToolRegistry {
    /// Creates a new repository from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ToolRegistryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ToolRegistryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ToolRegistryError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(ToolRegistryError::persistence)?
    }
}

#[async_trait]
impl ToolRegistryRepository for PostgresToolRegistry {
    async fn register(&self, registration: &ToolRegistration) -> ToolRegistryResult<()> {
        let tool_id = registration.id();
        let tool_name = registration.name().clone();
        let new_row = to_new_row(registration);

        self.run_blocking(move |connection| {
            diesel::insert_into(tool_registrations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_name_unique_violation(info.as_ref()) =>
                    {
                        ToolRegistryError::DuplicateToolName(tool_name.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ToolRegistryError::DuplicateTool(tool_id)
                    }
                    _ => ToolRegistryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_name(&self, name: &ToolName) -> ToolRegistryResult<Option<ToolRegistration>> {
        let lookup = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = tool_registrations::table
                .filter(tool_registrations::name.eq(&lookup))
                .select(ToolRegistrationRow::as_select())
                .first::<ToolRegistrationRow>(connection)
                .optional()
                .map_err(ToolRegistryError::persistence)?;
            row.map(row_to_registration).transpose()
        })
        .await
    }

    async fn deregister(&self, name: &ToolName) -> ToolRegistryResult<()> {
        let target = name.clone();
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                tool_registrations::table.filter(tool_registrations::name.eq(target.as_str())),
            )
            .execute(connection)
            .map_err(ToolRegistryError::persistence)?;

            if deleted == 0 {
                return Err(ToolRegistryError::NotFound(target));
            }
            Ok(())
        })
        .await
    }

    async fn list_all(&self) -> ToolRegistryResult<Vec<ToolRegistration>> {
        self.run_blocking(move |connection| {
            let rows = tool_registrations::table
                .order(tool_registrations::name.asc())
                .select(ToolRegistrationRow::as_select())
                .load::<ToolRegistrationRow>(connection)
                .map_err(ToolRegistryError::persistence)?;
            rows.into_iter().map(row_to_registration).collect()
        })
        .await
    }

    async fn ping(&self) -> ToolRegistryResult<()> {
        self.run_blocking(move |connection| {
            diesel::sql_query("SELECT 1")
                .execute(connection)
                .map_err(ToolRegistryError::persistence)?;
            Ok(())
        })
        .await
    }
}

fn to_new_row(registration: &ToolRegistration) -> NewToolRegistrationRow {
    NewToolRegistrationRow {
        id: registration.id().into_inner(),
        name: registration.name().as_str().to_owned(),
        token: registration.sealed_token().to_owned(),
        schema: registration.schema().to_json(),
        created_at: registration.created_at(),
    }
}

fn row_to_registration(row: ToolRegistrationRow) -> ToolRegistryResult<ToolRegistration> {
    let ToolRegistrationRow {
        id,
        name,
        token,
        schema,
        created_at,
    } = row;

    let parsed_name = ToolName::new(name).map_err(ToolRegistryError::invalid_persisted_data)?;
    let (parsed_schema, fallbacks) =
        ToolSchema::from_persisted(&schema).map_err(ToolRegistryError::invalid_persisted_data)?;
    for field in &fallbacks {
        warn!(
            tool = %parsed_name,
            field = %field,
            "unknown persisted field type, treating as string"
        );
    }

    Ok(ToolRegistration::from_persisted(PersistedToolData {
        id: ToolId::from_uuid(id),
        name: parsed_name,
        token,
        schema: parsed_schema,
        created_at,
    }))
}

fn is_name_unique_violation(info: &dyn diesel::result::DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == NAME_UNIQUE_CONSTRAINT)
}
