//! Plans: free-text goals decomposed into routed task chains.
//!
//! [`services::PlanDecomposer`] parses plan text, routes every unit through
//! the project's rules and persists the resulting chain in one batch.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
