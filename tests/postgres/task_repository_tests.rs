//! `PostgreSQL` integration tests for task persistence and lifecycle.

use std::sync::Arc;

use baton::task::{
    domain::{ErrorKind, TaskOwner, TaskStatus},
    ports::{HandoffRepository, TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryError},
    services::{CompleteTaskRequest, CreateTaskRequest},
};
use rstest::rstest;

use super::helpers::{BoxError, pg_stack};

fn request(
    project_id: &baton::project::domain::ProjectId,
    title: &str,
    owner: TaskOwner,
) -> CreateTaskRequest {
    CreateTaskRequest::new(
        project_id.clone(),
        title,
        format!("{title} in detail"),
        [format!("{title} is done")],
    )
    .with_owner(owner)
}

fn long_summary() -> String {
    "Implemented the change and verified it end to end against staging. ".repeat(4)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_round_trips_a_task() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("alpha").await?;
    let lifecycle = stack.lifecycle();

    let created = lifecycle
        .create_task(
            request(&project_id, "Import ledgers", TaskOwner::Agent)
                .with_priority(3)
                .with_created_by("planner"),
        )
        .await?;
    let found = stack
        .tasks
        .find_by_id(created.id())
        .await?
        .ok_or("task not stored")?;
    assert_eq!(found.id(), created.id());
    assert_eq!(found.title(), created.title());
    assert_eq!(found.priority(), 3);
    assert_eq!(found.created_by(), Some("planner"));
    assert_eq!(found.status(), TaskStatus::Ready);
    assert_eq!(found.revision(), 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_completion_persists_handoffs_and_unblocks() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("alpha").await?;
    let lifecycle = stack.lifecycle();

    let build = lifecycle
        .create_task(request(&project_id, "Build importer", TaskOwner::Agent))
        .await?;
    let review = lifecycle
        .create_task(
            request(&project_id, "Check importer", TaskOwner::Human)
                .with_dependencies([build.id()]),
        )
        .await?;
    assert_eq!(review.status(), TaskStatus::Blocked);

    lifecycle.claim(build.id(), TaskOwner::Agent, None).await?;
    let outcome = lifecycle
        .complete(CompleteTaskRequest::new(
            build.id(),
            TaskOwner::Agent,
            "importer merged",
            long_summary(),
        ))
        .await?;
    assert_eq!(outcome.unblocked, vec![review.id()]);

    let review_now = lifecycle.get_task(review.id()).await?;
    assert_eq!(review_now.status(), TaskStatus::AwaitingHuman);
    let inbound = stack.tasks.list_for_task(review.id()).await?;
    assert_eq!(inbound.len(), 1);
    assert_eq!(
        inbound.first().map(|handoff| handoff.from_task_id()),
        Some(build.id())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_rejects_stale_revision() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("alpha").await?;
    let lifecycle = stack.lifecycle();
    let task = lifecycle
        .create_task(request(&project_id, "Import ledgers", TaskOwner::Agent))
        .await?;

    lifecycle.cancel(task.id(), None).await?;

    let mut stale = TaskChangeSet::new();
    stale.update(task.clone());
    let result = stack.tasks.commit(&stale).await;
    assert!(
        matches!(
            result,
            Err(TaskRepositoryError::Conflict {
                expected: 0,
                actual: 1,
                ..
            })
        ),
        "expected conflict, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_concurrent_claims_have_one_winner() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("alpha").await?;
    let lifecycle = Arc::new(stack.lifecycle());
    let task = lifecycle
        .create_task(request(&project_id, "Import ledgers", TaskOwner::Agent))
        .await?;

    let task_id = task.id();
    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&lifecycle);
        handles.push(tokio::spawn(async move {
            service.claim(task_id, TaskOwner::Agent, None).await
        }));
    }
    let mut winners = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => winners += 1,
            Err(err) => assert!(
                matches!(
                    err.kind(),
                    ErrorKind::InvalidTransition | ErrorKind::Conflict
                ),
                "unexpected loser error {err}"
            ),
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_list_filters_and_orders() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let alpha = stack.add_project("alpha").await?;
    let beta = stack.add_project("beta").await?;
    let lifecycle = stack.lifecycle();

    let low = lifecycle
        .create_task(request(&alpha, "Low", TaskOwner::Agent).with_priority(1))
        .await?;
    let high = lifecycle
        .create_task(request(&alpha, "High", TaskOwner::Agent).with_priority(9))
        .await?;
    lifecycle
        .create_task(request(&alpha, "Human", TaskOwner::Human).with_priority(5))
        .await?;
    lifecycle
        .create_task(request(&beta, "Elsewhere", TaskOwner::Agent).with_priority(7))
        .await?;

    let listed = stack
        .tasks
        .list(
            &TaskFilter::new()
                .for_project(alpha)
                .with_owner(TaskOwner::Agent)
                .with_status(TaskStatus::Ready),
        )
        .await?;
    let ids: Vec<_> = listed.iter().map(|task| task.id()).collect();
    assert_eq!(ids, vec![high.id(), low.id()]);
    Ok(())
}
