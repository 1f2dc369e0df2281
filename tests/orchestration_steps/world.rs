//! Shared world state for orchestration BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use baton::plan::{
    adapters::memory::InMemoryPlanRepository,
    services::{PlanDecomposer, PlanDecomposition},
};
use baton::project::{
    adapters::memory::InMemoryProjectRepository, domain::ProjectId, services::ProjectService,
};
use baton::routing::adapters::memory::InMemoryTemplateRepository;
use baton::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::TaskId,
    services::{HandoffService, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Lifecycle service type used by the BDD world.
pub type TestLifecycle =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryProjectRepository, DefaultClock>;

/// Decomposer type used by the BDD world.
pub type TestDecomposer = PlanDecomposer<
    InMemoryPlanRepository,
    InMemoryTaskRepository,
    InMemoryProjectRepository,
    DefaultClock,
>;

/// Project service type used by the BDD world.
pub type TestProjects =
    ProjectService<InMemoryProjectRepository, InMemoryTemplateRepository, DefaultClock>;

/// Scenario world wiring every service to one set of in-memory stores.
pub struct OrchestrationWorld {
    pub projects: TestProjects,
    pub lifecycle: TestLifecycle,
    pub decomposer: TestDecomposer,
    pub handoffs: HandoffService<InMemoryTaskRepository>,
    pub project_id: Option<ProjectId>,
    pub task_ids: HashMap<String, TaskId>,
    pub last_exit_code: Option<i32>,
    pub decomposition: Option<PlanDecomposition>,
}

impl OrchestrationWorld {
    /// Creates a world with empty stores.
    #[must_use]
    pub fn new() -> Self {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let project_store = Arc::new(InMemoryProjectRepository::new());
        let clock = Arc::new(DefaultClock);
        Self {
            projects: ProjectService::new(
                Arc::clone(&project_store),
                Arc::new(InMemoryTemplateRepository::new()),
                Arc::clone(&clock),
            ),
            lifecycle: TaskLifecycleService::new(
                Arc::clone(&tasks),
                Arc::clone(&project_store),
                Arc::clone(&clock),
            ),
            decomposer: PlanDecomposer::new(
                Arc::new(InMemoryPlanRepository::new()),
                Arc::clone(&tasks),
                project_store,
                clock,
            ),
            handoffs: HandoffService::new(tasks),
            project_id: None,
            task_ids: HashMap::new(),
            last_exit_code: None,
            decomposition: None,
        }
    }

    /// Returns the scenario's project.
    ///
    /// # Errors
    ///
    /// Returns an error when no project step ran.
    pub fn project(&self) -> eyre::Result<ProjectId> {
        self.project_id
            .clone()
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// Resolves a task created earlier in the scenario by title.
    ///
    /// # Errors
    ///
    /// Returns an error when no task with that title was created.
    pub fn task(&self, title: &str) -> eyre::Result<TaskId> {
        self.task_ids
            .get(title)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task titled {title:?} in scenario world"))
    }
}

impl Default for OrchestrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrchestrationWorld {
    OrchestrationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// A handoff summary comfortably above the minimum length.
#[must_use]
pub fn detailed_summary() -> String {
    "Finished the work, checked every acceptance criterion and noted the open edges. "
        .repeat(3)
}
