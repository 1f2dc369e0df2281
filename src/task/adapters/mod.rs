//! Adapter implementations for task and handoff storage.

pub mod memory;
pub mod postgres;
