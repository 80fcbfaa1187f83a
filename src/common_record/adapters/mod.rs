//! Adapter implementations for the common record store port.

pub mod memory;
pub mod postgres;
