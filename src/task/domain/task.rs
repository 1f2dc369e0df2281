//! Task aggregate root and its lifecycle state machine.
//!
//! ```text
//! blocked --deps done--> ready | awaiting_human --claim--> in_progress --complete--> done
//! in_progress --self_unblock--> blocked
//! {blocked, ready, awaiting_human, in_progress} --cancel--> cancelled
//! ```
//!
//! `start` is an audit-only transition from `in_progress` to itself. Methods
//! validate every precondition before mutating, so a rejected call leaves the
//! task untouched.

use super::{
    DependencyGraph, MIN_HANDOFF_SUMMARY_CHARS, TaskCategory, TaskDomainError, TaskId,
    TaskOperation, TaskOwner, TaskStatus,
};
use crate::plan::domain::PlanId;
use crate::project::domain::ProjectId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    /// Project the task belongs to.
    pub project_id: ProjectId,
    /// Plan the task was decomposed from, if any.
    pub plan_id: Option<PlanId>,
    /// Short title.
    pub title: String,
    /// What must be done.
    pub description: String,
    /// When the task counts as done.
    pub acceptance_criteria: Vec<String>,
    /// Routing category.
    pub category: TaskCategory,
    /// Role that may claim the task.
    pub owner: TaskOwner,
    /// Prerequisite tasks.
    pub depends_on: Vec<TaskId>,
    /// Higher is more urgent.
    pub priority: i32,
    /// Free-text creator role.
    pub created_by: Option<String>,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    plan_id: Option<PlanId>,
    title: String,
    description: String,
    acceptance_criteria: Vec<String>,
    category: TaskCategory,
    owner: TaskOwner,
    status: TaskStatus,
    depends_on: Vec<TaskId>,
    priority: i32,
    output: Option<String>,
    logs: Vec<String>,
    waiting_reason: Option<String>,
    claimed_by: Option<TaskOwner>,
    created_by: Option<String>,
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Source plan, if any.
    pub plan_id: Option<PlanId>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Acceptance criteria.
    pub acceptance_criteria: Vec<String>,
    /// Category.
    pub category: TaskCategory,
    /// Owner.
    pub owner: TaskOwner,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Dependency ids.
    pub depends_on: Vec<TaskId>,
    /// Priority.
    pub priority: i32,
    /// Completion output.
    pub output: Option<String>,
    /// Log entries.
    pub logs: Vec<String>,
    /// Waiting reason while blocked.
    pub waiting_reason: Option<String>,
    /// Claim holder.
    pub claimed_by: Option<TaskOwner>,
    /// Creator role.
    pub created_by: Option<String>,
    /// Storage revision.
    pub revision: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task, starting it executable when `graph` shows every
    /// dependency done and blocked otherwise.
    ///
    /// Duplicate dependency ids are collapsed, keeping first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the title, description or acceptance
    /// criteria are blank, or a dependency is unknown to `graph`.
    pub fn new(
        draft: TaskDraft,
        graph: &DependencyGraph,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = required_text(&draft.title, TaskDomainError::EmptyTitle)?;
        let description = required_text(&draft.description, TaskDomainError::EmptyDescription)?;
        let acceptance_criteria: Vec<String> = draft
            .acceptance_criteria
            .iter()
            .map(|criterion| criterion.trim())
            .filter(|criterion| !criterion.is_empty())
            .map(str::to_owned)
            .collect();
        if acceptance_criteria.is_empty() {
            return Err(TaskDomainError::EmptyAcceptanceCriteria);
        }

        let mut depends_on = Vec::with_capacity(draft.depends_on.len());
        for dependency_id in draft.depends_on {
            if !graph.contains(dependency_id) {
                return Err(TaskDomainError::UnknownDependency(dependency_id));
            }
            if !depends_on.contains(&dependency_id) {
                depends_on.push(dependency_id);
            }
        }

        let timestamp = clock.utc();
        let mut task = Self {
            id: TaskId::new(),
            project_id: draft.project_id,
            plan_id: draft.plan_id,
            title,
            description,
            acceptance_criteria,
            category: draft.category,
            owner: draft.owner,
            status: TaskStatus::executable_for(draft.owner),
            depends_on,
            priority: draft.priority,
            output: None,
            logs: Vec::new(),
            waiting_reason: None,
            claimed_by: None,
            created_by: draft
                .created_by
                .map(|creator| creator.trim().to_owned())
                .filter(|creator| !creator.is_empty()),
            revision: 0,
            created_at: timestamp,
            updated_at: timestamp,
        };
        if !graph.is_satisfied(&task) {
            task.block(graph);
        }
        Ok(task)
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            plan_id: data.plan_id,
            title: data.title,
            description: data.description,
            acceptance_criteria: data.acceptance_criteria,
            category: data.category,
            owner: data.owner,
            status: data.status,
            depends_on: data.depends_on,
            priority: data.priority,
            output: data.output,
            logs: data.logs,
            waiting_reason: data.waiting_reason,
            claimed_by: data.claimed_by,
            created_by: data.created_by,
            revision: data.revision,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the source plan, if any.
    #[must_use]
    pub const fn plan_id(&self) -> Option<PlanId> {
        self.plan_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the acceptance criteria.
    #[must_use]
    pub fn acceptance_criteria(&self) -> &[String] {
        &self.acceptance_criteria
    }

    /// Returns the routing category.
    #[must_use]
    pub const fn category(&self) -> TaskCategory {
        self.category
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> TaskOwner {
        self.owner
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the dependency ids in insertion order.
    #[must_use]
    pub fn depends_on(&self) -> &[TaskId] {
        &self.depends_on
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the completion output, present once done.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Returns the log entries.
    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Returns why the task is blocked on human work, if it is.
    #[must_use]
    pub fn waiting_reason(&self) -> Option<&str> {
        self.waiting_reason.as_deref()
    }

    /// Returns the claim holder while in progress.
    #[must_use]
    pub const fn claimed_by(&self) -> Option<TaskOwner> {
        self.claimed_by
    }

    /// Returns the creator role, if recorded.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Returns the storage revision this copy was read at.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy stamped with a storage revision. Used by repository
    /// adapters when persisting an update.
    #[must_use]
    pub const fn with_revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Claims an executable task for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless the task is
    /// executable, [`TaskDomainError::OwnerMismatch`] when `role` is not the
    /// owner, and [`TaskDomainError::DependenciesUnsatisfied`] when `graph`
    /// shows an unfinished dependency.
    pub fn claim(
        &mut self,
        role: TaskOwner,
        graph: &DependencyGraph,
        log: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.is_executable() {
            return Err(self.invalid(TaskOperation::Claim));
        }
        if self.owner != role {
            return Err(TaskDomainError::OwnerMismatch {
                task_id: self.id,
                owner: self.owner,
                role,
            });
        }
        if !graph.is_satisfied(self) {
            return Err(TaskDomainError::DependenciesUnsatisfied(self.id));
        }
        self.status = TaskStatus::InProgress;
        self.claimed_by = Some(role);
        self.waiting_reason = None;
        self.append_log(log);
        self.touch(clock);
        Ok(())
    }

    /// Records that claimed work began.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless in progress, and
    /// [`TaskDomainError::ClaimMismatch`] when `role` does not hold the claim.
    pub fn start(
        &mut self,
        role: TaskOwner,
        log: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_claimed_by(role, TaskOperation::Start)?;
        self.append_log(log);
        self.touch(clock);
        Ok(())
    }

    /// Completes claimed work.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] unless in progress,
    /// [`TaskDomainError::ClaimMismatch`] when `role` does not hold the claim,
    /// and [`TaskDomainError::HandoffTooShort`] when the summary is shorter
    /// than [`MIN_HANDOFF_SUMMARY_CHARS`].
    pub fn complete(
        &mut self,
        role: TaskOwner,
        output: impl Into<String>,
        handoff_summary: &str,
        log: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_claimed_by(role, TaskOperation::Complete)?;
        let length = handoff_summary.chars().count();
        if length < MIN_HANDOFF_SUMMARY_CHARS {
            return Err(TaskDomainError::HandoffTooShort {
                task_id: self.id,
                length,
                minimum: MIN_HANDOFF_SUMMARY_CHARS,
            });
        }
        self.status = TaskStatus::Done;
        self.output = Some(output.into());
        self.append_log(log);
        self.touch(clock);
        Ok(())
    }

    /// Rolls an in-progress agent task back behind new human-owned work.
    ///
    /// The new ids are merged into the dependency set; the claim is released
    /// and the task waits until they are done.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError`] when the task is not in progress, not
    /// agent-owned, `new_dependencies` is empty, names an unknown or
    /// agent-owned task, closes a cycle, or adds nothing new.
    pub fn self_unblock(
        &mut self,
        role: TaskOwner,
        new_dependencies: &[TaskId],
        graph: &DependencyGraph,
        log: Option<&str>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::InProgress {
            return Err(self.invalid(TaskOperation::SelfUnblock));
        }
        if self.owner != TaskOwner::Agent || role != TaskOwner::Agent {
            return Err(TaskDomainError::SelfUnblockNotAgent {
                task_id: self.id,
                role,
            });
        }
        if new_dependencies.is_empty() {
            return Err(TaskDomainError::SelfUnblockWithoutDependencies(self.id));
        }
        for dependency_id in new_dependencies {
            let owner = graph
                .owner_of(*dependency_id)
                .ok_or(TaskDomainError::UnknownDependency(*dependency_id))?;
            if owner != TaskOwner::Human {
                return Err(TaskDomainError::SelfUnblockNonHumanDependency {
                    task_id: self.id,
                    dependency_id: *dependency_id,
                    owner,
                });
            }
            self.ensure_acyclic(*dependency_id, graph)?;
        }
        if new_dependencies
            .iter()
            .all(|id| self.depends_on.contains(id))
        {
            return Err(TaskDomainError::SelfUnblockNoNewDependency(self.id));
        }

        for dependency_id in new_dependencies {
            if !self.depends_on.contains(dependency_id) {
                self.depends_on.push(*dependency_id);
            }
        }
        self.claimed_by = None;
        if graph.is_satisfied(self) {
            self.status = TaskStatus::executable_for(self.owner);
            self.waiting_reason = None;
        } else {
            self.block(graph);
        }
        self.append_log(log);
        self.touch(clock);
        Ok(())
    }

    /// Abandons the task. Dependents are left blocked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] from a terminal status.
    pub fn cancel(&mut self, log: Option<&str>, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.status.is_terminal() {
            return Err(self.invalid(TaskOperation::Cancel));
        }
        self.status = TaskStatus::Cancelled;
        self.claimed_by = None;
        self.waiting_reason = None;
        self.append_log(log);
        self.touch(clock);
        Ok(())
    }

    /// Adds a dependency edge, returning `false` when it already existed.
    ///
    /// An executable task that gains an unfinished dependency moves back to
    /// blocked.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidTransition`] for terminal tasks,
    /// [`TaskDomainError::SelfDependency`] for self-edges,
    /// [`TaskDomainError::UnknownDependency`] when `graph` does not know the
    /// id, and [`TaskDomainError::DependencyCycle`] when the edge would close
    /// a cycle.
    pub fn add_dependency(
        &mut self,
        dependency_id: TaskId,
        graph: &DependencyGraph,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        if self.status.is_terminal() {
            return Err(self.invalid(TaskOperation::AddDependency));
        }
        if !graph.contains(dependency_id) && dependency_id != self.id {
            return Err(TaskDomainError::UnknownDependency(dependency_id));
        }
        self.ensure_acyclic(dependency_id, graph)?;
        if self.depends_on.contains(&dependency_id) {
            return Ok(false);
        }
        self.depends_on.push(dependency_id);
        let waiting = self.status.is_executable() || self.status == TaskStatus::Blocked;
        if waiting && !graph.is_satisfied(self) {
            self.block(graph);
        }
        self.touch(clock);
        Ok(true)
    }

    /// Moves a blocked task whose dependencies are all done to its owner's
    /// executable status. Returns `false` when nothing changed.
    pub fn unblock_if_satisfied(&mut self, graph: &DependencyGraph, clock: &impl Clock) -> bool {
        if self.status != TaskStatus::Blocked || !graph.is_satisfied(self) {
            return false;
        }
        self.status = TaskStatus::executable_for(self.owner);
        self.waiting_reason = None;
        self.touch(clock);
        true
    }

    /// Recomputes the waiting reason of a task that stays blocked.
    /// Returns `false` when nothing changed.
    pub fn refresh_waiting_reason(&mut self, graph: &DependencyGraph, clock: &impl Clock) -> bool {
        if self.status != TaskStatus::Blocked {
            return false;
        }
        let reason = self.human_wait(graph);
        if reason == self.waiting_reason {
            return false;
        }
        self.waiting_reason = reason;
        self.touch(clock);
        true
    }

    fn block(&mut self, graph: &DependencyGraph) {
        self.status = TaskStatus::Blocked;
        self.waiting_reason = self.human_wait(graph);
    }

    /// Names the unfinished human-owned dependencies, if any.
    fn human_wait(&self, graph: &DependencyGraph) -> Option<String> {
        let pending: Vec<TaskId> = self
            .depends_on
            .iter()
            .filter(|id| graph.status_of(**id) != Some(TaskStatus::Done))
            .copied()
            .collect();
        let humans = pending
            .iter()
            .filter(|id| graph.owner_of(**id) == Some(TaskOwner::Human))
            .count();
        (humans > 0).then(|| {
            format!(
                "waiting on {humans} human task(s) among {} unfinished dependencies",
                pending.len()
            )
        })
    }

    fn ensure_acyclic(
        &self,
        dependency_id: TaskId,
        graph: &DependencyGraph,
    ) -> Result<(), TaskDomainError> {
        if dependency_id == self.id {
            return Err(TaskDomainError::SelfDependency(self.id));
        }
        if graph.would_create_cycle(self.id, dependency_id) {
            return Err(TaskDomainError::DependencyCycle {
                task_id: self.id,
                dependency_id,
            });
        }
        Ok(())
    }

    fn ensure_claimed_by(
        &self,
        role: TaskOwner,
        operation: TaskOperation,
    ) -> Result<(), TaskDomainError> {
        if self.status != TaskStatus::InProgress {
            return Err(self.invalid(operation));
        }
        if self.claimed_by != Some(role) {
            return Err(TaskDomainError::ClaimMismatch {
                task_id: self.id,
                role,
            });
        }
        Ok(())
    }

    const fn invalid(&self, operation: TaskOperation) -> TaskDomainError {
        TaskDomainError::InvalidTransition {
            task_id: self.id,
            operation,
            status: self.status,
        }
    }

    fn append_log(&mut self, entry: Option<&str>) {
        if let Some(text) = entry.map(str::trim).filter(|text| !text.is_empty()) {
            self.logs.push(text.to_owned());
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

fn required_text(value: &str, empty_error: TaskDomainError) -> Result<String, TaskDomainError> {
    let normalized = value.trim();
    if normalized.is_empty() {
        return Err(empty_error);
    }
    Ok(normalized.to_owned())
}
