//! Adapter implementations for the tool registry and table store ports.

pub mod memory;
pub mod postgres;
