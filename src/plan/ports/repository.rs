//! Repository port for plan persistence.

use crate::plan::domain::{Plan, PlanId};
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for plan repository operations.
pub type PlanRepositoryResult<T> = Result<T, PlanRepositoryError>;

/// Plan persistence contract.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    /// Stores a new plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanRepositoryError::DuplicatePlan`] when the id exists.
    async fn store(&self, plan: &Plan) -> PlanRepositoryResult<()>;

    /// Finds a plan by identifier.
    async fn find_by_id(&self, id: PlanId) -> PlanRepositoryResult<Option<Plan>>;

    /// Lists a project's plans, oldest first.
    async fn list_by_project(&self, project_id: &ProjectId) -> PlanRepositoryResult<Vec<Plan>>;

    /// Deletes a plan, returning `false` when it did not exist.
    async fn delete(&self, id: PlanId) -> PlanRepositoryResult<bool>;
}

/// Errors returned by plan repository implementations.
#[derive(Debug, Clone, Error)]
pub enum PlanRepositoryError {
    /// A plan with the same identifier already exists.
    #[error("duplicate plan identifier: {0}")]
    DuplicatePlan(PlanId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PlanRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
