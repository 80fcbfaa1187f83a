//! Shared helpers for `PostgreSQL` integration tests.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use mockable::DefaultClock;
use std::sync::{Arc, OnceLock};
use toolvault::auth::PlainTextVerifier;
use toolvault::tool_registry::{
    adapters::postgres::{PgPool, PostgresToolRegistry, PostgresToolTableStore, connect_pool},
    services::ToolLifecycleService,
};
use uuid::Uuid;

/// Boxed error used by test helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming a database the suite may create tables in.
pub const TEST_DATABASE_URL_ENV: &str = "TOOLVAULT_TEST_DATABASE_URL";

/// SQL creating the registry relation.
pub const CREATE_TOOL_REGISTRATIONS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_tool_registrations/up.sql");

/// SQL creating the shared common-record relation.
pub const CREATE_COMMON_RECORDS_SQL: &str =
    include_str!("../../migrations/2026-10-01-000001_create_common_records/up.sql");

static MIGRATED: OnceLock<Result<(), String>> = OnceLock::new();

/// Lifecycle service backed by `PostgreSQL`.
pub type PgLifecycle = ToolLifecycleService<
    PostgresToolRegistry,
    PostgresToolTableStore,
    PlainTextVerifier,
    DefaultClock,
>;

/// Applies all schema migrations to the database at the given URL.
///
/// This is a blocking operation that should be called from `spawn_blocking`
/// or a synchronous context.
fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_TOOL_REGISTRATIONS_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_COMMON_RECORDS_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Returns a pool on the migrated test database, or `None` when no test
/// database is configured.
///
/// # Errors
///
/// Returns an error if migration or pool construction fails.
pub async fn test_pool() -> Result<Option<PgPool>, BoxError> {
    let Ok(url) = std::env::var(TEST_DATABASE_URL_ENV) else {
        return Ok(None);
    };
    tokio::task::spawn_blocking(move || -> Result<Option<PgPool>, BoxError> {
        MIGRATED
            .get_or_init(|| apply_migrations(&url).map_err(|err| err.to_string()))
            .clone()
            .map_err(BoxError::from)?;
        let pool = connect_pool(&url, 4).map_err(|err| Box::new(err) as BoxError)?;
        Ok(Some(pool))
    })
    .await
    .map_err(|err| Box::new(err) as BoxError)?
}

/// Builds a lifecycle service on `pool`.
pub fn lifecycle(pool: &PgPool) -> PgLifecycle {
    ToolLifecycleService::new(
        Arc::new(PostgresToolRegistry::new(pool.clone())),
        Arc::new(PostgresToolTableStore::new(pool.clone())),
        Arc::new(PlainTextVerifier),
        Arc::new(DefaultClock),
    )
}

/// Returns a tool name no other test run uses.
pub fn unique_name(stem: &str) -> String {
    format!("{stem}_{}", Uuid::new_v4().simple())
}
