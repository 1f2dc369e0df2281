//! Adapter implementations for routing template storage.

pub mod memory;
pub mod postgres;
