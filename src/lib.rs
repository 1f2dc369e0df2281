//! Baton: task orchestration for mixed teams of agents and humans.
//!
//! A project binds a snapshot of routing rules. Plans written as free text
//! are decomposed into chained tasks, each routed to the role that must own
//! it. Tasks move through a guarded lifecycle over a dependency graph and
//! hand context forward to their dependents on completion.
//!
//! # Architecture
//!
//! Every context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: In-memory and `PostgreSQL` implementations of ports
//!
//! # Modules
//!
//! - [`routing`]: Routing templates and category inference
//! - [`project`]: Projects and their frozen routing snapshots
//! - [`plan`]: Plan text parsing and decomposition into task chains
//! - [`task`]: Task lifecycle, dependency graph and handoffs
//! - [`scheduler`]: Polling worker that dispatches ready agent tasks
//! - [`persistence`]: Shared connection pool plumbing

pub mod persistence;
pub mod plan;
pub mod project;
pub mod routing;
pub mod scheduler;
pub mod task;
