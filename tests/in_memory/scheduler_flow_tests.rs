//! The scheduler dispatching decomposed plans to an agent that reports back.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use baton::project::{domain::ProjectId, services::InitializeProjectRequest};
use baton::scheduler::{
    ports::{InvocationError, InvocationOutcome, TaskInvoker},
    services::{Scheduler, TickOutcome},
};
use baton::task::{
    domain::{Task, TaskId, TaskStatus},
    services::CompleteTaskRequest,
};
use rstest::rstest;

use super::helpers::{Lifecycle, Stack, finish, stack, summary_for};

/// Agent double that completes each task it is handed.
struct CompletingAgent {
    lifecycle: Lifecycle,
    seen: Mutex<Vec<TaskId>>,
}

#[async_trait]
impl TaskInvoker for CompletingAgent {
    fn prepare(&self, _task: &Task) -> Result<(), InvocationError> {
        Ok(())
    }

    async fn invoke(&self, task: &Task) -> Result<InvocationOutcome, InvocationError> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(task.id());
        let completed = self
            .lifecycle
            .complete(CompleteTaskRequest::new(
                task.id(),
                task.owner(),
                "agent output",
                summary_for(task),
            ))
            .await;
        Ok(InvocationOutcome::new(Some(if completed.is_ok() { 0 } else { 1 })))
    }
}

fn scheduler_for(
    stack: &Stack,
) -> (
    Scheduler<
        baton::task::adapters::memory::InMemoryTaskRepository,
        baton::project::adapters::memory::InMemoryProjectRepository,
        mockable::DefaultClock,
        CompletingAgent,
    >,
    Arc<CompletingAgent>,
) {
    let agent = Arc::new(CompletingAgent {
        lifecycle: stack.lifecycle(),
        seen: Mutex::new(Vec::new()),
    });
    let scheduler = Scheduler::new(
        stack.lifecycle(),
        Arc::clone(&agent),
        Duration::from_millis(10),
    );
    (scheduler, agent)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agent_only_plan_is_driven_to_completion(stack: Stack) -> eyre::Result<()> {
    let project_id = ProjectId::new("parser")?;
    stack
        .projects
        .initialize(InitializeProjectRequest::new(project_id.clone(), "Parser"))
        .await?;
    let decomposition = stack
        .decomposer
        .split_plan_to_tasks(
            &project_id,
            "Parser cleanup\n1. Extract the lexer\n2. Wire the lexer into the CLI\n3. Add lexer benchmarks",
            None,
        )
        .await?;
    let (scheduler, agent) = scheduler_for(&stack);

    for task_id in decomposition.task_ids() {
        let outcome = scheduler.tick().await?;
        eyre::ensure!(
            outcome
                == TickOutcome::Dispatched {
                    task_id,
                    outcome: InvocationOutcome::new(Some(0)),
                },
            "unexpected tick {outcome:?}"
        );
    }
    eyre::ensure!(scheduler.tick().await? == TickOutcome::Idle, "nothing left");

    let seen = agent
        .seen
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    eyre::ensure!(seen == decomposition.task_ids(), "dispatched in plan order");
    for task_id in decomposition.task_ids() {
        eyre::ensure!(
            stack.lifecycle.get_task(task_id).await?.status() == TaskStatus::Done,
            "task {task_id} done"
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn scheduler_waits_for_human_steps(stack: Stack) -> eyre::Result<()> {
    let project_id = ProjectId::new("payments")?;
    stack
        .projects
        .initialize(InitializeProjectRequest::new(project_id.clone(), "Payments"))
        .await?;
    let decomposition = stack
        .decomposer
        .split_plan_to_tasks(
            &project_id,
            "Payments\n1. Scaffold the gateway client\n2. Create API key for the sandbox\n3. Wire the gateway client",
            None,
        )
        .await?;
    let [scaffold, credentials, wire] = decomposition.tasks.as_slice() else {
        eyre::bail!("expected three tasks");
    };
    let (scheduler, _agent) = scheduler_for(&stack);

    let first = scheduler.tick().await?;
    eyre::ensure!(
        matches!(first, TickOutcome::Dispatched { task_id, .. } if task_id == scaffold.id()),
        "agent step dispatched first: {first:?}"
    );
    eyre::ensure!(
        scheduler.tick().await? == TickOutcome::Idle,
        "human step is not dispatched"
    );
    eyre::ensure!(
        stack.lifecycle.get_task(credentials.id()).await?.status() == TaskStatus::AwaitingHuman,
        "credentials wait on a human"
    );

    finish(&stack.lifecycle, credentials).await?;
    let last = scheduler.tick().await?;
    eyre::ensure!(
        matches!(last, TickOutcome::Dispatched { task_id, .. } if task_id == wire.id()),
        "final agent step dispatched: {last:?}"
    );
    Ok(())
}
