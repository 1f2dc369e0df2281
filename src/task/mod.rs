//! Task orchestration: the task aggregate, its dependency graph, lifecycle
//! and handoff protocol.
//!
//! A task starts blocked or executable depending on its prerequisites, is
//! claimed by the role that owns it, and on completion hands context to each
//! dependent while unblocking the ones whose prerequisites are now done.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
