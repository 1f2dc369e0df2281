//! Adapter implementations for project storage.

pub mod memory;
pub mod postgres;
