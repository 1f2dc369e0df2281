//! Service layer for the task lifecycle state machine.
//!
//! Each operation reads the task and a snapshot of its project's dependency
//! graph, applies the transition in the domain, and commits the result as
//! one guarded change set. Nothing is retried here: a lost race surfaces as
//! an error and the caller decides whether to try again.

use crate::plan::domain::PlanId;
use crate::project::{
    domain::ProjectId,
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::task::{
    domain::{
        DependencyGraph, ErrorKind, Handoff, HandoffArtifact, Task, TaskCategory,
        TaskDomainError, TaskDraft, TaskId, TaskOperation, TaskOwner, TaskStatus, plan_handoffs,
    },
    ports::{TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for creating a single task.
///
/// Category and owner are inferred from the project's routing rules unless
/// set explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    project_id: ProjectId,
    title: String,
    description: String,
    acceptance_criteria: Vec<String>,
    plan_id: Option<PlanId>,
    category: Option<TaskCategory>,
    owner: Option<TaskOwner>,
    depends_on: Vec<TaskId>,
    priority: i32,
    created_by: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        description: impl Into<String>,
        acceptance_criteria: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: description.into(),
            acceptance_criteria: acceptance_criteria.into_iter().map(Into::into).collect(),
            plan_id: None,
            category: None,
            owner: None,
            depends_on: Vec::new(),
            priority: 0,
            created_by: None,
        }
    }

    /// Links the task to a plan.
    #[must_use]
    pub const fn with_plan(mut self, plan_id: PlanId) -> Self {
        self.plan_id = Some(plan_id);
        self
    }

    /// Sets the category instead of inferring it.
    #[must_use]
    pub const fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the owner instead of routing it.
    #[must_use]
    pub const fn with_owner(mut self, owner: TaskOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Sets the prerequisite tasks.
    #[must_use]
    pub fn with_dependencies(mut self, depends_on: impl IntoIterator<Item = TaskId>) -> Self {
        self.depends_on = depends_on.into_iter().collect();
        self
    }

    /// Sets the priority; higher is more urgent.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Records the creator role.
    #[must_use]
    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}

/// Request payload for completing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteTaskRequest {
    task_id: TaskId,
    role: TaskOwner,
    output: String,
    handoff_summary: String,
    artifacts: Vec<HandoffArtifact>,
    log: Option<String>,
}

impl CompleteTaskRequest {
    /// Creates a completion request.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        role: TaskOwner,
        output: impl Into<String>,
        handoff_summary: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            role,
            output: output.into(),
            handoff_summary: handoff_summary.into(),
            artifacts: Vec::new(),
            log: None,
        }
    }

    /// Attaches structured artifacts to every emitted handoff.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: impl IntoIterator<Item = HandoffArtifact>) -> Self {
        self.artifacts = artifacts.into_iter().collect();
        self
    }

    /// Appends a log entry on success.
    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}

/// Request payload for an agent rolling its task back behind human work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfUnblockRequest {
    task_id: TaskId,
    role: TaskOwner,
    new_dependencies: Vec<TaskId>,
    log: Option<String>,
}

impl SelfUnblockRequest {
    /// Creates a request acting as the agent.
    #[must_use]
    pub fn new(task_id: TaskId, new_dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        Self {
            task_id,
            role: TaskOwner::Agent,
            new_dependencies: new_dependencies.into_iter().collect(),
            log: None,
        }
    }

    /// Overrides the acting role.
    #[must_use]
    pub const fn as_role(mut self, role: TaskOwner) -> Self {
        self.role = role;
        self
    }

    /// Appends a log entry on success.
    #[must_use]
    pub fn with_log(mut self, log: impl Into<String>) -> Self {
        self.log = Some(log.into());
        self
    }
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    /// The completed task.
    pub task: Task,
    /// Handoffs written by the completion.
    pub handoffs: Vec<Handoff>,
    /// Dependents that moved from blocked to executable.
    pub unblocked: Vec<TaskId>,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// A lifecycle rule or validation failed.
    #[error(transparent)]
    Domain(TaskDomainError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// A dependency id does not resolve to a task in the same project.
    #[error("dependency task {0} does not exist in this project")]
    DependencyNotFound(TaskId),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The project no longer accepts new work.
    #[error("project {0} is archived")]
    ProjectArchived(ProjectId),
    /// A record this operation relied on changed before it committed.
    #[error("task {0} was modified concurrently; re-read and retry")]
    ConcurrentModification(TaskId),
    /// Task repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Project repository operation failed.
    #[error(transparent)]
    Project(#[from] ProjectRepositoryError),
}

impl TaskLifecycleError {
    /// Classifies the error for caller-facing handling.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::NotFound(_) | Self::ProjectNotFound(_) => ErrorKind::NotFound,
            Self::DependencyNotFound(_) => ErrorKind::NotFoundDependency,
            Self::ProjectArchived(_) => ErrorKind::Validation,
            Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::Repository(_) | Self::Project(_) => ErrorKind::Store,
        }
    }

    /// Returns the process exit status a CLI should use.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}

impl From<TaskDomainError> for TaskLifecycleError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::UnknownDependency(id) => Self::DependencyNotFound(id),
            other => Self::Domain(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<R, P, C>
where
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    projects: Arc<P>,
    clock: Arc<C>,
}

struct ProjectSnapshot {
    tasks: Vec<Task>,
    graph: DependencyGraph,
}

impl ProjectSnapshot {
    fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == id)
    }
}

impl<R, P, C> TaskLifecycleService<R, P, C>
where
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, projects: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            repository,
            projects,
            clock,
        }
    }

    /// Creates a single task, executable if its dependencies are done and
    /// blocked otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the project is missing or
    /// archived, validation fails, or a dependency is not in the project.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let project = self
            .projects
            .find_by_id(&request.project_id)
            .await?
            .ok_or_else(|| TaskLifecycleError::ProjectNotFound(request.project_id.clone()))?;
        if !project.is_active() {
            return Err(TaskLifecycleError::ProjectArchived(request.project_id));
        }
        let rules = &project.routing().rules;
        let category = request
            .category
            .unwrap_or_else(|| rules.match_category(&request.title, &request.description));
        let owner = request.owner.unwrap_or_else(|| rules.owner_for(category));

        let snapshot = self.snapshot(&request.project_id).await?;
        let task = Task::new(
            TaskDraft {
                project_id: request.project_id,
                plan_id: request.plan_id,
                title: request.title,
                description: request.description,
                acceptance_criteria: request.acceptance_criteria,
                category,
                owner,
                depends_on: request.depends_on,
                priority: request.priority,
                created_by: request.created_by,
            },
            &snapshot.graph,
            &*self.clock,
        )?;

        let mut changes = TaskChangeSet::new();
        guard_all(&mut changes, &snapshot.graph, task.depends_on());
        changes.insert(task.clone());
        self.commit(&changes, task.id(), None).await?;
        info!(
            task_id = %task.id(),
            project_id = %task.project_id(),
            owner = %task.owner(),
            status = %task.status(),
            "task created"
        );
        Ok(task)
    }

    /// Retrieves a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when it does not exist.
    pub async fn get_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }

    /// Lists tasks matching `filter`, highest priority then oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the scan fails.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list(filter).await?)
    }

    /// Adds a dependency edge. Re-adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] for self-edges, cycles, unknown ids
    /// and terminal tasks.
    pub async fn add_dependency(
        &self,
        task_id: TaskId,
        dependency_id: TaskId,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let snapshot = self.snapshot(task.project_id()).await?;
        let expected = task.status();
        if !task.add_dependency(dependency_id, &snapshot.graph, &*self.clock)? {
            debug!(task_id = %task_id, dependency_id = %dependency_id, "dependency already present");
            return Ok(task);
        }

        let mut changes = TaskChangeSet::new();
        let reach = snapshot.graph.trace(dependency_id, task_id);
        guard_all(&mut changes, &snapshot.graph, &reach.visited);
        changes.update(task.clone());
        self.commit(&changes, task_id, Some((TaskOperation::AddDependency, expected)))
            .await?;
        info!(
            task_id = %task_id,
            dependency_id = %dependency_id,
            status = %task.status(),
            "dependency added"
        );
        Ok(stored(task))
    }

    /// Claims an executable task for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is missing, not
    /// executable, owned by the other role or has unfinished dependencies.
    pub async fn claim(
        &self,
        task_id: TaskId,
        role: TaskOwner,
        log: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let snapshot = self.snapshot(task.project_id()).await?;
        let expected = task.status();
        task.claim(role, &snapshot.graph, log, &*self.clock)?;

        let mut changes = TaskChangeSet::new();
        changes.update(task.clone());
        self.commit(&changes, task_id, Some((TaskOperation::Claim, expected)))
            .await?;
        info!(task_id = %task_id, role = %role, "task claimed");
        Ok(stored(task))
    }

    /// Records that claimed work began.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] unless `role` holds the claim.
    pub async fn start(
        &self,
        task_id: TaskId,
        role: TaskOwner,
        log: Option<&str>,
    ) -> TaskLifecycleResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let expected = task.status();
        task.start(role, log, &*self.clock)?;

        let mut changes = TaskChangeSet::new();
        changes.update(task.clone());
        self.commit(&changes, task_id, Some((TaskOperation::Start, expected)))
            .await?;
        debug!(task_id = %task_id, role = %role, "task started");
        Ok(stored(task))
    }

    /// Completes claimed work, writes handoffs to every dependent (or one
    /// audit handoff) and unblocks dependents whose prerequisites are now
    /// all done.
    ///
    /// A rejected completion writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when `role` does not hold the claim or
    /// the handoff summary is too short.
    pub async fn complete(
        &self,
        request: CompleteTaskRequest,
    ) -> TaskLifecycleResult<CompletionOutcome> {
        let task_id = request.task_id;
        let mut task = self.get_task(task_id).await?;
        let mut snapshot = self.snapshot(task.project_id()).await?;
        let expected = task.status();
        task.complete(
            request.role,
            request.output,
            &request.handoff_summary,
            request.log.as_deref(),
            &*self.clock,
        )?;

        let downstream = snapshot.graph.downstream_of(task_id);
        let handoffs = plan_handoffs(
            task_id,
            &downstream,
            &request.handoff_summary,
            &request.artifacts,
            &*self.clock,
        )?;

        let mut changes = TaskChangeSet::new();
        changes.update(task.clone());
        snapshot.graph.record(&task);
        let mut unblocked = Vec::new();
        for dependent_id in &downstream {
            let Some(stored) = snapshot.task(*dependent_id) else {
                continue;
            };
            let mut dependent = stored.clone();
            if dependent.unblock_if_satisfied(&snapshot.graph, &*self.clock) {
                unblocked.push(dependent.id());
                changes.update(dependent);
            } else {
                if dependent.refresh_waiting_reason(&snapshot.graph, &*self.clock) {
                    changes.update(dependent.clone());
                } else {
                    changes.guard(dependent.id(), dependent.revision());
                }
                guard_all(&mut changes, &snapshot.graph, dependent.depends_on());
            }
        }
        for handoff in &handoffs {
            changes.record_handoff(handoff.clone());
        }
        self.commit(&changes, task_id, Some((TaskOperation::Complete, expected)))
            .await?;
        info!(
            task_id = %task_id,
            handoffs = handoffs.len(),
            unblocked = unblocked.len(),
            "task completed"
        );
        Ok(CompletionOutcome {
            task: stored(task),
            handoffs,
            unblocked,
        })
    }

    /// Rolls an in-progress agent task back behind new human-owned
    /// dependencies and releases the claim.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when any self-unblock rule fails.
    pub async fn self_unblock(&self, request: SelfUnblockRequest) -> TaskLifecycleResult<Task> {
        let task_id = request.task_id;
        let mut task = self.get_task(task_id).await?;
        let snapshot = self.snapshot(task.project_id()).await?;
        let expected = task.status();
        task.self_unblock(
            request.role,
            &request.new_dependencies,
            &snapshot.graph,
            request.log.as_deref(),
            &*self.clock,
        )?;

        let mut changes = TaskChangeSet::new();
        changes.update(task.clone());
        for dependency_id in &request.new_dependencies {
            let reach = snapshot.graph.trace(*dependency_id, task_id);
            guard_all(&mut changes, &snapshot.graph, &reach.visited);
        }
        self.commit(&changes, task_id, Some((TaskOperation::SelfUnblock, expected)))
            .await?;
        info!(
            task_id = %task_id,
            dependencies = task.depends_on().len(),
            status = %task.status(),
            "task self-unblocked"
        );
        Ok(stored(task))
    }

    /// Cancels a non-terminal task. Dependents stay blocked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the task is already terminal.
    pub async fn cancel(&self, task_id: TaskId, log: Option<&str>) -> TaskLifecycleResult<Task> {
        let mut task = self.get_task(task_id).await?;
        let expected = task.status();
        task.cancel(log, &*self.clock)?;

        let mut changes = TaskChangeSet::new();
        changes.update(task.clone());
        self.commit(&changes, task_id, Some((TaskOperation::Cancel, expected)))
            .await?;
        info!(task_id = %task_id, "task cancelled");
        Ok(stored(task))
    }

    /// Returns `true` when every dependency of the task is done.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when it does not exist.
    pub async fn is_satisfied(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        let task = self.get_task(task_id).await?;
        let snapshot = self.snapshot(task.project_id()).await?;
        Ok(snapshot.graph.is_satisfied(&task))
    }

    /// Returns the tasks that depend on `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when it does not exist.
    pub async fn downstream_of(&self, task_id: TaskId) -> TaskLifecycleResult<Vec<TaskId>> {
        let task = self.get_task(task_id).await?;
        let snapshot = self.snapshot(task.project_id()).await?;
        Ok(snapshot.graph.downstream_of(task_id))
    }

    async fn snapshot(&self, project_id: &ProjectId) -> TaskLifecycleResult<ProjectSnapshot> {
        let tasks = self
            .repository
            .list(&TaskFilter::new().for_project(project_id.clone()))
            .await?;
        let graph = DependencyGraph::from_tasks(&tasks);
        Ok(ProjectSnapshot { tasks, graph })
    }

    /// Commits `changes`, translating revision conflicts.
    ///
    /// When the target task itself moved to another status, the loser sees
    /// the transition error the winner's status implies.
    async fn commit(
        &self,
        changes: &TaskChangeSet,
        task_id: TaskId,
        transition: Option<(TaskOperation, TaskStatus)>,
    ) -> TaskLifecycleResult<()> {
        match self.repository.commit(changes).await {
            Ok(()) => Ok(()),
            Err(TaskRepositoryError::Conflict {
                task_id: conflicted,
                ..
            }) => {
                warn!(task_id = %task_id, conflicted = %conflicted, "lost a concurrent write");
                Err(self.conflict_error(task_id, conflicted, transition).await)
            }
            Err(TaskRepositoryError::NotFound(missing)) if missing == task_id => {
                Err(TaskLifecycleError::NotFound(missing))
            }
            Err(TaskRepositoryError::NotFound(missing)) => {
                Err(TaskLifecycleError::DependencyNotFound(missing))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn conflict_error(
        &self,
        task_id: TaskId,
        conflicted: TaskId,
        transition: Option<(TaskOperation, TaskStatus)>,
    ) -> TaskLifecycleError {
        let Some((operation, expected)) = transition.filter(|_| conflicted == task_id) else {
            return TaskLifecycleError::ConcurrentModification(conflicted);
        };
        match self.repository.find_by_id(task_id).await {
            Ok(Some(current)) if current.status() != expected => {
                TaskDomainError::InvalidTransition {
                    task_id,
                    operation,
                    status: current.status(),
                }
                .into()
            }
            _ => TaskLifecycleError::ConcurrentModification(conflicted),
        }
    }
}

/// Returns `task` at the revision its committed update was stored under.
fn stored(task: Task) -> Task {
    let revision = task.revision() + 1;
    task.with_revision(revision)
}

/// Guards every id in `ids` at its snapshot revision.
fn guard_all(changes: &mut TaskChangeSet, graph: &DependencyGraph, ids: &[TaskId]) {
    for id in ids {
        if let Some(revision) = graph.revision_of(*id) {
            changes.guard(*id, revision);
        }
    }
}
