//! Plan decomposition: text in, a routed and chained task batch out.

use crate::plan::{
    domain::{ParsedTask, Plan, PlanDomainError, PlanId, parse_plan_text},
    ports::{PlanRepository, PlanRepositoryError},
};
use crate::project::{
    domain::ProjectId,
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::routing::domain::RoutingRules;
use crate::task::{
    domain::{DependencyGraph, Task, TaskDomainError, TaskDraft, TaskId},
    ports::{TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Role recorded as the creator of decomposed tasks.
pub const DECOMPOSER_ROLE: &str = "planner";

/// Plan and the tasks decomposed from it, in plan order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDecomposition {
    /// Stored plan.
    pub plan: Plan,
    /// Created tasks; each depends on the one before it.
    pub tasks: Vec<Task>,
}

impl PlanDecomposition {
    /// Returns the created task ids in plan order.
    #[must_use]
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(Task::id).collect()
    }
}

/// Service-level errors for plan operations.
#[derive(Debug, Error)]
pub enum PlanServiceError {
    /// Plan text failed validation.
    #[error(transparent)]
    Domain(#[from] PlanDomainError),
    /// A decomposed unit failed task validation.
    #[error(transparent)]
    Task(#[from] TaskDomainError),
    /// The plan does not exist.
    #[error("plan not found: {0}")]
    NotFound(PlanId),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The project no longer accepts new work.
    #[error("project {0} is archived")]
    ProjectArchived(ProjectId),
    /// Tasks still reference the plan.
    #[error("plan {plan_id} is referenced by {task_count} task(s)")]
    PlanInUse {
        /// Plan that was to be deleted.
        plan_id: PlanId,
        /// Number of referencing tasks.
        task_count: usize,
    },
    /// The plan has more steps than a priority can order.
    #[error("plan has too many steps: {0}")]
    TooManySteps(usize),
    /// Plan repository operation failed.
    #[error(transparent)]
    Repository(#[from] PlanRepositoryError),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// Project repository operation failed.
    #[error(transparent)]
    Project(#[from] ProjectRepositoryError),
}

/// Result type for plan service operations.
pub type PlanServiceResult<T> = Result<T, PlanServiceError>;

/// Splits plans into routed task chains and manages stored plans.
#[derive(Clone)]
pub struct PlanDecomposer<Pl, R, P, C>
where
    Pl: PlanRepository,
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    plans: Arc<Pl>,
    tasks: Arc<R>,
    projects: Arc<P>,
    clock: Arc<C>,
}

impl<Pl, R, P, C> PlanDecomposer<Pl, R, P, C>
where
    Pl: PlanRepository,
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new decomposer.
    #[must_use]
    pub const fn new(plans: Arc<Pl>, tasks: Arc<R>, projects: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            plans,
            tasks,
            projects,
            clock,
        }
    }

    /// Stores the plan and creates one task per parsed unit.
    ///
    /// Units are routed with `rules`, or the project's embedded rules when
    /// `None`. Each task depends on its predecessor and earlier steps get
    /// higher priority. The whole batch commits at once; if it fails the
    /// stored plan is removed again.
    ///
    /// # Errors
    ///
    /// Returns [`PlanServiceError`] for blank text, a missing or archived
    /// project, or a store failure.
    pub async fn split_plan_to_tasks(
        &self,
        project_id: &ProjectId,
        text: &str,
        rules: Option<&RoutingRules>,
    ) -> PlanServiceResult<PlanDecomposition> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| PlanServiceError::ProjectNotFound(project_id.clone()))?;
        if !project.is_active() {
            return Err(PlanServiceError::ProjectArchived(project_id.clone()));
        }
        let units = parse_plan_text(text)?;
        let plan = Plan::new(project_id.clone(), text, &*self.clock)?;
        let routing = rules.unwrap_or(&project.routing().rules);
        let created = self.build_chain(&plan, &units, routing)?;

        self.plans.store(&plan).await?;
        let mut changes = TaskChangeSet::new();
        for task in &created {
            changes.insert(task.clone());
        }
        if let Err(err) = self.tasks.commit(&changes).await {
            warn!(plan_id = %plan.id(), error = %err, "task batch failed; removing plan");
            if let Err(cleanup) = self.plans.delete(plan.id()).await {
                warn!(plan_id = %plan.id(), error = %cleanup, "plan cleanup failed");
            }
            return Err(err.into());
        }
        info!(
            plan_id = %plan.id(),
            project_id = %project_id,
            tasks = created.len(),
            "plan decomposed"
        );
        Ok(PlanDecomposition {
            plan,
            tasks: created,
        })
    }

    /// Retrieves a plan.
    ///
    /// # Errors
    ///
    /// Returns [`PlanServiceError::NotFound`] when it does not exist.
    pub async fn get_plan(&self, plan_id: PlanId) -> PlanServiceResult<Plan> {
        self.plans
            .find_by_id(plan_id)
            .await?
            .ok_or(PlanServiceError::NotFound(plan_id))
    }

    /// Lists a project's plans, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`PlanServiceError::Repository`] when the scan fails.
    pub async fn list_plans(&self, project_id: &ProjectId) -> PlanServiceResult<Vec<Plan>> {
        Ok(self.plans.list_by_project(project_id).await?)
    }

    /// Lists the tasks decomposed from a plan, in plan order.
    ///
    /// # Errors
    ///
    /// Returns [`PlanServiceError::NotFound`] when the plan does not exist.
    pub async fn plan_tasks(&self, plan_id: PlanId) -> PlanServiceResult<Vec<Task>> {
        let plan = self.get_plan(plan_id).await?;
        let filter = TaskFilter::new()
            .for_project(plan.project_id().clone())
            .for_plan(plan_id);
        Ok(self.tasks.list(&filter).await?)
    }

    /// Deletes a plan that no task references.
    ///
    /// # Errors
    ///
    /// Returns [`PlanServiceError::PlanInUse`] while tasks reference the
    /// plan and [`PlanServiceError::NotFound`] when it does not exist.
    pub async fn delete_plan(&self, plan_id: PlanId) -> PlanServiceResult<()> {
        let referencing = self.plan_tasks(plan_id).await?;
        if !referencing.is_empty() {
            return Err(PlanServiceError::PlanInUse {
                plan_id,
                task_count: referencing.len(),
            });
        }
        if !self.plans.delete(plan_id).await? {
            return Err(PlanServiceError::NotFound(plan_id));
        }
        info!(plan_id = %plan_id, "plan deleted");
        Ok(())
    }

    fn build_chain(
        &self,
        plan: &Plan,
        units: &[ParsedTask],
        rules: &RoutingRules,
    ) -> PlanServiceResult<Vec<Task>> {
        let mut graph = DependencyGraph::default();
        let mut created: Vec<Task> = Vec::with_capacity(units.len());
        for unit in units {
            let description = if unit.description.is_empty() {
                unit.title.clone()
            } else {
                unit.description.clone()
            };
            let category = rules.match_category(&unit.title, &description);
            let step = i32::try_from(unit.order)
                .map_err(|_| PlanServiceError::TooManySteps(units.len()))?;
            let task = Task::new(
                TaskDraft {
                    project_id: plan.project_id().clone(),
                    plan_id: Some(plan.id()),
                    title: unit.title.clone(),
                    description,
                    acceptance_criteria: unit.acceptance_criteria.clone(),
                    category,
                    owner: rules.owner_for(category),
                    depends_on: created.last().map(Task::id).into_iter().collect(),
                    priority: -step,
                    created_by: Some(DECOMPOSER_ROLE.to_owned()),
                },
                &graph,
                &*self.clock,
            )?;
            graph.record(&task);
            created.push(task);
        }
        Ok(created)
    }
}
