//! Legacy shared-table ingestion path.
//!
//! Unregistered tools append free-form JSON documents to one shared
//! relation. There is no schema and no per-tool table; the only guard is a
//! static token set, and only for records flagged as sensitive. This path
//! never consults the tool registry.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
