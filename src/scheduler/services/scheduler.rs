//! Polling scheduler that claims ready agent work and dispatches it.

use crate::project::{domain::ProjectId, ports::ProjectRepository};
use crate::scheduler::ports::{InvocationError, InvocationOutcome, TaskInvoker};
use crate::task::{
    domain::{ErrorKind, Task, TaskId, TaskOwner, TaskStatus},
    ports::{TaskFilter, TaskRepository},
    services::{TaskLifecycleError, TaskLifecycleService},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Log line written on a task when the scheduler claims it.
pub const SCHEDULER_CLAIM_LOG: &str = "claimed by scheduler";

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No claimable agent task was found.
    Idle,
    /// One task was claimed and handed to the invoker.
    Dispatched {
        /// Dispatched task.
        task_id: TaskId,
        /// How the invocation ended.
        outcome: InvocationOutcome,
    },
}

/// Errors raised by a scheduler tick.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Reading or claiming tasks failed.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// The executor could not be prepared for the task, or failed to run
    /// once the task was claimed.
    #[error("dispatch of task {task_id} failed: {source}")]
    Invocation {
        /// Task being dispatched.
        task_id: TaskId,
        /// Invoker failure.
        #[source]
        source: InvocationError,
    },
}

/// Claims the highest-priority ready agent task each tick and invokes it.
///
/// Claims go through [`TaskLifecycleService::claim`], so a scheduler racing
/// another claimant loses cleanly and moves on to the next candidate.
pub struct Scheduler<R, P, C, I>
where
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
    I: TaskInvoker,
{
    lifecycle: TaskLifecycleService<R, P, C>,
    invoker: Arc<I>,
    project: Option<ProjectId>,
    poll_interval: Duration,
}

impl<R, P, C, I> Scheduler<R, P, C, I>
where
    R: TaskRepository,
    P: ProjectRepository,
    C: Clock + Send + Sync,
    I: TaskInvoker,
{
    /// Creates a scheduler over every project.
    #[must_use]
    pub const fn new(
        lifecycle: TaskLifecycleService<R, P, C>,
        invoker: Arc<I>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            lifecycle,
            invoker,
            project: None,
            poll_interval,
        }
    }

    /// Restricts dispatch to one project.
    #[must_use]
    pub fn for_project(mut self, project_id: ProjectId) -> Self {
        self.project = Some(project_id);
        self
    }

    /// Runs one poll: claims and invokes at most one task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Lifecycle`] when the store fails and
    /// [`SchedulerError::Invocation`] when the task could not be handed to
    /// its executor. A failed preparation leaves the task unclaimed.
    pub async fn tick(&self) -> Result<TickOutcome, SchedulerError> {
        let Some(task) = self.claim_next().await? else {
            return Ok(TickOutcome::Idle);
        };
        let task_id = task.id();
        info!(task_id = %task_id, project_id = %task.project_id(), "dispatching task");
        let outcome = self
            .invoker
            .invoke(&task)
            .await
            .map_err(|source| SchedulerError::Invocation { task_id, source })?;
        if !outcome.is_success() {
            warn!(task_id = %task_id, exit_code = ?outcome.exit_code, "agent exited unsuccessfully");
        }
        Ok(TickOutcome::Dispatched { task_id, outcome })
    }

    /// Ticks until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Shutdown is observed between ticks; a running invocation is never
    /// interrupted. Tick failures are logged and polling continues.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_ms = self.poll_interval.as_millis(),
            project = ?self.project.as_ref().map(ProjectId::as_str),
            "scheduler started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            match self.tick().await {
                Ok(TickOutcome::Idle) => debug!("no ready agent task"),
                Ok(TickOutcome::Dispatched { task_id, outcome }) => {
                    debug!(task_id = %task_id, exit_code = ?outcome.exit_code, "dispatch finished");
                }
                Err(err) => error!(error = %err, "scheduler tick failed"),
            }
            let stop = tokio::select! {
                changed = shutdown.changed() => changed.is_err(),
                () = tokio::time::sleep(self.poll_interval) => false,
            };
            if stop {
                break;
            }
        }
        info!("scheduler stopped");
    }

    async fn claim_next(&self) -> Result<Option<Task>, SchedulerError> {
        let mut filter = TaskFilter::new()
            .with_owner(TaskOwner::Agent)
            .with_status(TaskStatus::Ready);
        if let Some(project_id) = &self.project {
            filter = filter.for_project(project_id.clone());
        }
        let candidates = self.lifecycle.list_tasks(&filter).await?;
        for candidate in candidates {
            if !self.lifecycle.is_satisfied(candidate.id()).await? {
                continue;
            }
            self.invoker
                .prepare(&candidate)
                .map_err(|source| SchedulerError::Invocation {
                    task_id: candidate.id(),
                    source,
                })?;
            match self
                .lifecycle
                .claim(candidate.id(), TaskOwner::Agent, Some(SCHEDULER_CLAIM_LOG))
                .await
            {
                Ok(task) => return Ok(Some(task)),
                Err(err) if lost_race(&err) => {
                    debug!(task_id = %candidate.id(), error = %err, "claim lost; trying next task");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}

const fn lost_race(err: &TaskLifecycleError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidTransition
            | ErrorKind::Conflict
            | ErrorKind::DependenciesUnsatisfied
            | ErrorKind::NotFound
    )
}
