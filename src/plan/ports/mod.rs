//! Port contracts for plan storage.

pub mod repository;

pub use repository::{PlanRepository, PlanRepositoryError, PlanRepositoryResult};
