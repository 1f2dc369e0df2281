//! Read side of the handoff protocol.

use crate::task::{
    domain::{Handoff, TaskId},
    ports::{HandoffRepository, TaskRepository, TaskRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for handoff queries.
#[derive(Debug, Error)]
pub enum HandoffQueryError {
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Handoff lookup for executors reading upstream context.
#[derive(Clone)]
pub struct HandoffService<R>
where
    R: TaskRepository + HandoffRepository,
{
    repository: Arc<R>,
}

impl<R> HandoffService<R>
where
    R: TaskRepository + HandoffRepository,
{
    /// Creates a new handoff service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Returns handoffs sent from or to `task_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffQueryError::TaskNotFound`] for unknown tasks.
    pub async fn list_by_task(&self, task_id: TaskId) -> Result<Vec<Handoff>, HandoffQueryError> {
        if self.repository.find_by_id(task_id).await?.is_none() {
            return Err(HandoffQueryError::TaskNotFound(task_id));
        }
        Ok(self.repository.list_for_task(task_id).await?)
    }

    /// Returns handoffs addressed to `task_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffQueryError::TaskNotFound`] for unknown tasks.
    pub async fn inbound(&self, task_id: TaskId) -> Result<Vec<Handoff>, HandoffQueryError> {
        let all = self.list_by_task(task_id).await?;
        Ok(all
            .into_iter()
            .filter(|handoff| handoff.to_task_id() == Some(task_id))
            .collect())
    }
}
