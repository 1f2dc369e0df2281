//! Repository ports for task and handoff persistence.
//!
//! Every lifecycle write is a [`TaskChangeSet`] committed atomically. Each
//! updated task carries the revision it was read at, and each guard names a
//! task the operation relied on without changing it. The commit fails with
//! [`TaskRepositoryError::Conflict`] when any of those revisions moved, so
//! two writers racing on the same records never both succeed.

use crate::plan::domain::PlanId;
use crate::project::domain::ProjectId;
use crate::task::domain::{Handoff, Task, TaskCategory, TaskId, TaskOwner, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Revision a task must still have when a change set commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionGuard {
    /// Guarded task.
    pub task_id: TaskId,
    /// Revision observed when the operation read the task.
    pub revision: u64,
}

/// Atomic batch of task writes.
#[derive(Debug, Clone, Default)]
pub struct TaskChangeSet {
    inserts: Vec<Task>,
    updates: Vec<Task>,
    guards: Vec<RevisionGuard>,
    handoffs: Vec<Handoff>,
}

impl TaskChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a new task.
    pub fn insert(&mut self, task: Task) {
        self.inserts.push(task);
    }

    /// Adds an update to a stored task, checked against `task.revision()`.
    pub fn update(&mut self, task: Task) {
        self.guards.retain(|guard| guard.task_id != task.id());
        self.updates.push(task);
    }

    /// Requires `task_id` to still be at `revision` at commit time.
    ///
    /// Ids already updated or guarded by this change set are skipped.
    pub fn guard(&mut self, task_id: TaskId, revision: u64) {
        let covered = self.updates.iter().any(|task| task.id() == task_id)
            || self.guards.iter().any(|guard| guard.task_id == task_id);
        if !covered {
            self.guards.push(RevisionGuard { task_id, revision });
        }
    }

    /// Adds a handoff record.
    pub fn record_handoff(&mut self, handoff: Handoff) {
        self.handoffs.push(handoff);
    }

    /// Returns the new tasks.
    #[must_use]
    pub fn inserts(&self) -> &[Task] {
        &self.inserts
    }

    /// Returns the updated tasks.
    #[must_use]
    pub fn updates(&self) -> &[Task] {
        &self.updates
    }

    /// Returns the revision guards.
    #[must_use]
    pub fn guards(&self) -> &[RevisionGuard] {
        &self.guards
    }

    /// Returns the handoff records.
    #[must_use]
    pub fn handoffs(&self) -> &[Handoff] {
        &self.handoffs
    }

    /// Returns `true` when nothing would be written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.handoffs.is_empty()
    }
}

/// Filtered scan over tasks.
///
/// Empty criteria match everything; `statuses` matches any listed status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    project_id: Option<ProjectId>,
    plan_id: Option<PlanId>,
    statuses: Vec<TaskStatus>,
    owner: Option<TaskOwner>,
    category: Option<TaskCategory>,
}

impl TaskFilter {
    /// Creates a filter matching every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one project.
    #[must_use]
    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Restricts to tasks decomposed from one plan.
    #[must_use]
    pub const fn for_plan(mut self, plan_id: PlanId) -> Self {
        self.plan_id = Some(plan_id);
        self
    }

    /// Adds an accepted status.
    #[must_use]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        if !self.statuses.contains(&status) {
            self.statuses.push(status);
        }
        self
    }

    /// Restricts to one owner.
    #[must_use]
    pub const fn with_owner(mut self, owner: TaskOwner) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Restricts to one category.
    #[must_use]
    pub const fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Returns the project restriction.
    #[must_use]
    pub const fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    /// Returns the plan restriction.
    #[must_use]
    pub const fn plan_id(&self) -> Option<PlanId> {
        self.plan_id
    }

    /// Returns the accepted statuses; empty means any.
    #[must_use]
    pub fn statuses(&self) -> &[TaskStatus] {
        &self.statuses
    }

    /// Returns the owner restriction.
    #[must_use]
    pub const fn owner(&self) -> Option<TaskOwner> {
        self.owner
    }

    /// Returns the category restriction.
    #[must_use]
    pub const fn category(&self) -> Option<TaskCategory> {
        self.category
    }

    /// Returns `true` when `task` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id
            .as_ref()
            .is_none_or(|project_id| task.project_id() == project_id)
            && self.plan_id.is_none_or(|plan_id| task.plan_id() == Some(plan_id))
            && (self.statuses.is_empty() || self.statuses.contains(&task.status()))
            && self.owner.is_none_or(|owner| task.owner() == owner)
            && self
                .category
                .is_none_or(|category| task.category() == category)
    }
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns matching tasks, highest priority first, then oldest first.
    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>>;

    /// Applies a change set atomically, storing each update at its read
    /// revision plus one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when an inserted id
    /// exists, [`TaskRepositoryError::NotFound`] when an updated or guarded
    /// id does not, and [`TaskRepositoryError::Conflict`] when a revision
    /// moved. Nothing is written on error.
    async fn commit(&self, changes: &TaskChangeSet) -> TaskRepositoryResult<()>;
}

/// Handoff query contract.
#[async_trait]
pub trait HandoffRepository: Send + Sync {
    /// Returns handoffs sent from or to `task_id`, newest first.
    async fn list_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Handoff>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task changed since it was read.
    #[error("task {task_id} changed concurrently (expected revision {expected}, found {actual})")]
    Conflict {
        /// Task whose revision moved.
        task_id: TaskId,
        /// Revision the writer read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
