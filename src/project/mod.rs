//! Projects: template-bound workspaces that own plans and tasks.
//!
//! A project freezes a snapshot of routing rules when it is initialised.
//! Archived projects keep their history but accept no new work.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
