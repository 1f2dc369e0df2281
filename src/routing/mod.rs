//! Routing templates: declarative rules that decide who owns a task.
//!
//! A template maps each task category to the role that must own it and
//! carries an ordered keyword table used to infer a category from task text.
//! At most one stored template is the default; when none is stored the
//! built-in rule set from [`domain::RoutingRules::builtin`] applies.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
