//! In-memory repository for task lifecycle tests and embedding.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Handoff, Task, TaskId},
    ports::{
        HandoffRepository, TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};

/// Thread-safe in-memory task and handoff repository.
///
/// A single write lock covers validation and application of a change set,
/// which makes every commit atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    handoffs: Vec<Handoff>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn check_revision(
    state: &InMemoryTaskState,
    task_id: TaskId,
    expected: u64,
) -> TaskRepositoryResult<()> {
    let stored = state
        .tasks
        .get(&task_id)
        .ok_or(TaskRepositoryError::NotFound(task_id))?;
    if stored.revision() == expected {
        Ok(())
    } else {
        Err(TaskRepositoryError::Conflict {
            task_id,
            expected,
            actual: stored.revision(),
        })
    }
}

fn validate(state: &InMemoryTaskState, changes: &TaskChangeSet) -> TaskRepositoryResult<()> {
    let mut fresh = HashSet::new();
    for task in changes.inserts() {
        if state.tasks.contains_key(&task.id()) || !fresh.insert(task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
    }
    for task in changes.updates() {
        check_revision(state, task.id(), task.revision())?;
    }
    for guard in changes.guards() {
        check_revision(state, guard.task_id, guard.revision)?;
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|left, right| {
            right
                .priority()
                .cmp(&left.priority())
                .then_with(|| left.created_at().cmp(&right.created_at()))
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(tasks)
    }

    async fn commit(&self, changes: &TaskChangeSet) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        validate(&state, changes)?;
        for task in changes.inserts() {
            state.tasks.insert(task.id(), task.clone());
        }
        for task in changes.updates() {
            let stored = task.clone().with_revision(task.revision() + 1);
            state.tasks.insert(task.id(), stored);
        }
        state.handoffs.extend(changes.handoffs().iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl HandoffRepository for InMemoryTaskRepository {
    async fn list_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Handoff>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut handoffs: Vec<Handoff> = state
            .handoffs
            .iter()
            .rev()
            .filter(|handoff| handoff.involves(task_id))
            .cloned()
            .collect();
        handoffs.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        Ok(handoffs)
    }
}
