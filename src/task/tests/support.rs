//! Shared fixtures for task service tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::DefaultClock;

use crate::project::{
    adapters::memory::InMemoryProjectRepository,
    domain::{Project, ProjectId, RoutingConfig},
    ports::ProjectRepository,
};
use crate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Handoff, Task, TaskId, TaskOwner},
    ports::{
        HandoffRepository, TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryResult,
    },
    services::{CompleteTaskRequest, CreateTaskRequest, TaskLifecycleService},
};

pub(super) type TestService =
    TaskLifecycleService<InMemoryTaskRepository, InMemoryProjectRepository, DefaultClock>;

pub(super) struct Harness {
    pub service: TestService,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub projects: Arc<InMemoryProjectRepository>,
    pub project_id: ProjectId,
}

pub(super) async fn harness() -> Harness {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let projects = Arc::new(InMemoryProjectRepository::new());
    let project_id = store_project(&projects, "alpha").await;
    Harness {
        service: TaskLifecycleService::new(
            Arc::clone(&tasks),
            Arc::clone(&projects),
            Arc::new(DefaultClock),
        ),
        tasks,
        projects,
        project_id,
    }
}

pub(super) async fn store_project(projects: &InMemoryProjectRepository, slug: &str) -> ProjectId {
    let project_id = ProjectId::new(slug).expect("valid slug");
    let project = Project::new(
        project_id.clone(),
        slug,
        RoutingConfig::builtin(),
        &DefaultClock,
    )
    .expect("valid project");
    projects.store(&project).await.expect("project stored");
    project_id
}

pub(super) fn long_summary() -> String {
    "Implemented the change and verified it end to end. ".repeat(5)
}

pub(super) fn request(
    project_id: &ProjectId,
    title: &str,
    owner: TaskOwner,
    depends_on: &[TaskId],
) -> CreateTaskRequest {
    CreateTaskRequest::new(
        project_id.clone(),
        title,
        format!("{title} in detail"),
        [format!("{title} is done")],
    )
    .with_owner(owner)
    .with_dependencies(depends_on.iter().copied())
}

impl Harness {
    pub(super) async fn create(
        &self,
        title: &str,
        owner: TaskOwner,
        depends_on: &[TaskId],
    ) -> Task {
        self.service
            .create_task(request(&self.project_id, title, owner, depends_on))
            .await
            .expect("task created")
    }

    pub(super) async fn run_to_done(&self, task_id: TaskId, role: TaskOwner) {
        self.service
            .claim(task_id, role, None)
            .await
            .expect("claim succeeds");
        self.service
            .start(task_id, role, None)
            .await
            .expect("start succeeds");
        self.service
            .complete(CompleteTaskRequest::new(
                task_id,
                role,
                "output",
                long_summary(),
            ))
            .await
            .expect("complete succeeds");
    }
}

/// Task store that applies a competing change set just before the next
/// commit.
#[derive(Debug, Default)]
pub(super) struct InterleavedTaskRepository {
    pub inner: InMemoryTaskRepository,
    competing: Mutex<Option<TaskChangeSet>>,
}

impl InterleavedTaskRepository {
    pub(super) fn interleave(&self, changes: TaskChangeSet) {
        *self.competing.lock().expect("lock") = Some(changes);
    }
}

#[async_trait]
impl TaskRepository for InterleavedTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        self.inner.list(filter).await
    }

    async fn commit(&self, changes: &TaskChangeSet) -> TaskRepositoryResult<()> {
        let competing = self.competing.lock().expect("lock").take();
        if let Some(first) = competing {
            self.inner.commit(&first).await?;
        }
        self.inner.commit(changes).await
    }
}

#[async_trait]
impl HandoffRepository for InterleavedTaskRepository {
    async fn list_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Handoff>> {
        self.inner.list_for_task(task_id).await
    }
}
