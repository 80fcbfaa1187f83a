//! Dynamic tool registry and per-tool record storage.
//!
//! A tool declares a schema once at registration; the registry keeps the
//! schema and the tool's token, and each tool gets its own relation whose
//! columns mirror the schema. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
