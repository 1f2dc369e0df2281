//! In-memory repository for plans.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::plan::{
    domain::{Plan, PlanId},
    ports::{PlanRepository, PlanRepositoryError, PlanRepositoryResult},
};
use crate::project::domain::ProjectId;

/// Thread-safe in-memory plan repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    state: Arc<RwLock<HashMap<PlanId, Plan>>>,
}

impl InMemoryPlanRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> PlanRepositoryError {
    PlanRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn store(&self, plan: &Plan) -> PlanRepositoryResult<()> {
        let mut plans = self.state.write().map_err(lock_error)?;
        if plans.contains_key(&plan.id()) {
            return Err(PlanRepositoryError::DuplicatePlan(plan.id()));
        }
        plans.insert(plan.id(), plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PlanId) -> PlanRepositoryResult<Option<Plan>> {
        let plans = self.state.read().map_err(lock_error)?;
        Ok(plans.get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> PlanRepositoryResult<Vec<Plan>> {
        let plans = self.state.read().map_err(lock_error)?;
        let mut listed: Vec<Plan> = plans
            .values()
            .filter(|plan| plan.project_id() == project_id)
            .cloned()
            .collect();
        listed.sort_by_key(Plan::created_at);
        Ok(listed)
    }

    async fn delete(&self, id: PlanId) -> PlanRepositoryResult<bool> {
        let mut plans = self.state.write().map_err(lock_error)?;
        Ok(plans.remove(&id).is_some())
    }
}
