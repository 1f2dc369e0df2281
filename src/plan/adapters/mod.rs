//! Adapter implementations for plan storage.

pub mod memory;
pub mod postgres;
