//! Administrative command line for Toolvault.
//!
//! Each subcommand performs one boundary operation against `PostgreSQL` and
//! prints the JSON result on stdout. Failures are printed on stderr as a
//! JSON body carrying the status class.

use clap::{Parser, Subcommand};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use mockable::DefaultClock;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use toolvault::auth::{AdminGate, ConfiguredVerifier, TokenSet};
use toolvault::common_record::{
    adapters::postgres::PostgresCommonRecordStore, services::CommonRecordService,
};
use toolvault::config::{ConfigError, ServiceConfig};
use toolvault::gateway::{GatewayError, ToolGateway};
use toolvault::telemetry::{self, TelemetryError};
use toolvault::tool_registry::{
    adapters::postgres::{PgPool, PostgresToolRegistry, PostgresToolTableStore, connect_pool},
    services::{RegisterToolRequest, ToolLifecycleService},
};
use tracing::info;

/// Schema migrations in application order.
const MIGRATIONS: [(&str, &str); 2] = [
    (
        "2026-10-01-000000_create_tool_registrations",
        include_str!("../../migrations/2026-10-01-000000_create_tool_registrations/up.sql"),
    ),
    (
        "2026-10-01-000001_create_common_records",
        include_str!("../../migrations/2026-10-01-000001_create_common_records/up.sql"),
    ),
];

type PgGateway = ToolGateway<
    PostgresToolRegistry,
    PostgresToolTableStore,
    PostgresCommonRecordStore,
    ConfiguredVerifier,
    DefaultClock,
>;

#[derive(Debug, Parser)]
#[command(name = "toolvault")]
#[command(about = "Multi-tenant JSON ingestion with per-tool storage", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the registry and common-record relations.
    Migrate,
    /// Print the at-rest form of a secret for the configured scheme.
    Seal {
        /// Secret to seal.
        secret: String,
    },
    /// Register a tool.
    Register {
        /// Tool name.
        #[arg(long)]
        name: String,
        /// Token callers must present on writes.
        #[arg(long)]
        token: String,
        /// Schema as a JSON array of `{"name", "type"}` objects.
        #[arg(long, value_parser = parse_json)]
        schema: Value,
        /// Admin credential.
        #[arg(long)]
        admin: Option<String>,
    },
    /// Store one record for a tool.
    Store {
        /// Tool name.
        #[arg(long)]
        name: String,
        /// Tool token.
        #[arg(long)]
        token: Option<String>,
        /// Record as a JSON object.
        #[arg(long, value_parser = parse_json)]
        payload: Value,
    },
    /// Read one page of a tool's records.
    Read {
        /// Tool name.
        #[arg(long)]
        name: String,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Rows to skip.
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Deregister a tool and drop its records.
    Delete {
        /// Tool name.
        #[arg(long)]
        name: String,
        /// Admin credential.
        #[arg(long)]
        admin: Option<String>,
    },
    /// List registered tools.
    List,
    /// Show one registered tool.
    Describe {
        /// Tool name.
        #[arg(long)]
        name: String,
    },
    /// Append a record to the shared common-record relation.
    Common {
        /// Free-form tool name.
        #[arg(long)]
        tool: String,
        /// `1` when the record is sensitive and needs a token.
        #[arg(long, default_value_t = 0)]
        sensitive: i64,
        /// Token from the static set.
        #[arg(long)]
        token: Option<String>,
        /// Record as a JSON object.
        #[arg(long, value_parser = parse_json)]
        data: Value,
    },
    /// List common records for a tool name.
    CommonList {
        /// Free-form tool name.
        #[arg(long)]
        tool: String,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Rows to skip.
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Check that the database is reachable.
    Health,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("cannot connect to database: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("cannot connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        source: diesel::result::Error,
    },
    #[error("migration task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("cannot write output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("cannot write output: {0}")]
    Io(#[from] io::Error),
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|err| format!("invalid JSON: {err}"))
}

fn emit(value: &impl Serialize) -> Result<(), CliError> {
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn build_gateway(config: &ServiceConfig, pool: &PgPool) -> Result<PgGateway, CliError> {
    let verifier = Arc::new(ConfiguredVerifier::from(config.credential_scheme));
    let clock = Arc::new(DefaultClock);

    let tools = ToolLifecycleService::new(
        Arc::new(PostgresToolRegistry::new(pool.clone())),
        Arc::new(PostgresToolTableStore::new(pool.clone())),
        Arc::clone(&verifier),
        Arc::clone(&clock),
    )
    .with_synthesizer(config.synthesizer()?)
    .with_pagination(config.pagination)
    .with_deregistration_policy(config.deregistration);

    let common = CommonRecordService::new(
        Arc::new(PostgresCommonRecordStore::new(pool.clone())),
        TokenSet::new(Arc::clone(&verifier), config.common_tokens.clone()),
        clock,
    )
    .with_pagination(config.pagination);

    let admin = AdminGate::new(verifier, config.admin_token.clone());
    Ok(ToolGateway::new(admin, tools, common))
}

async fn migrate(database_url: String) -> Result<(), CliError> {
    tokio::task::spawn_blocking(move || -> Result<(), CliError> {
        let mut connection = PgConnection::establish(&database_url)?;
        for (name, sql) in MIGRATIONS {
            connection
                .batch_execute(sql)
                .map_err(|source| CliError::Migration { name, source })?;
            info!(migration = name, "migration applied");
        }
        Ok(())
    })
    .await?
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default().with_env_overrides(|key| std::env::var(key).ok()),
    };
    telemetry::init(&config.log_level)?;

    if let Command::Seal { secret } = &cli.command {
        return emit(&config.seal(secret));
    }

    let database_url = config.require_database_url()?.to_owned();
    if matches!(cli.command, Command::Migrate) {
        migrate(database_url).await?;
        return emit(&"migrations applied");
    }

    let pool = connect_pool(&database_url, config.pool_size)?;
    let gateway = build_gateway(&config, &pool)?;
    dispatch(&gateway, cli.command).await
}

async fn dispatch(gateway: &PgGateway, command: Command) -> Result<(), CliError> {
    match command {
        Command::Register {
            name,
            token,
            schema,
            admin,
        } => emit(
            &gateway
                .register_tool(admin.as_deref(), RegisterToolRequest::new(name, token, schema))
                .await?,
        ),
        Command::Store {
            name,
            token,
            payload,
        } => emit(
            &gateway
                .store_tool_data(&name, token.as_deref(), &payload)
                .await?,
        ),
        Command::Read {
            name,
            limit,
            offset,
        } => emit(&gateway.get_tool_data(&name, limit, offset).await?),
        Command::Delete { name, admin } => {
            gateway.delete_tool(admin.as_deref(), &name).await?;
            emit(&serde_json::json!({"deleted": name}))
        }
        Command::List => emit(&gateway.list_tools().await?),
        Command::Describe { name } => emit(&gateway.describe_tool(&name).await?),
        Command::Common {
            tool,
            sensitive,
            token,
            data,
        } => emit(
            &gateway
                .store_common_record(&tool, sensitive, token.as_deref(), data)
                .await?,
        ),
        Command::CommonList {
            tool,
            limit,
            offset,
        } => emit(&gateway.list_common_records(&tool, limit, offset).await?),
        Command::Health => emit(&gateway.health().await?),
        Command::Migrate | Command::Seal { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Gateway(err)) => {
            writeln!(io::stderr(), "{}", err.to_json()).ok();
            ExitCode::from(2)
        }
        Err(err) => {
            writeln!(io::stderr(), "toolvault: {err}").ok();
            ExitCode::FAILURE
        }
    }
}
