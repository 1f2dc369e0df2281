//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod repository;

pub use repository::{
    HandoffRepository, RevisionGuard, TaskChangeSet, TaskFilter, TaskRepository,
    TaskRepositoryError, TaskRepositoryResult,
};
