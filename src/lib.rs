//! Toolvault: multi-tenant JSON ingestion with per-tool storage.
//!
//! Tools register a name, a token and a typed schema. Each registered tool
//! gets its own relation whose columns mirror the schema; writes are
//! validated against the stored schema and reads page through the relation
//! in insertion order. A legacy path appends free-form records from
//! unregistered tools to one shared relation.
//!
//! # Architecture
//!
//! Toolvault follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`tool_registry`]: Schema validation, table synthesis and tool lifecycle
//! - [`common_record`]: Legacy shared-table ingestion
//! - [`auth`]: Credential sealing and verification
//! - [`gateway`]: Boundary operations with status-class errors
//! - [`config`]: TOML service configuration
//! - [`telemetry`]: Logging initialisation

pub mod auth;
pub mod common_record;
pub mod config;
pub mod gateway;
pub mod telemetry;
pub mod tool_registry;
