//! End-to-end flows across templates, projects, plans and tasks.

use baton::project::{domain::ProjectId, services::InitializeProjectRequest};
use baton::routing::{
    domain::{KeywordMatcher, RoutingRule, RoutingRules},
    services::CreateTemplateRequest,
};
use baton::task::{
    domain::{Task, TaskCategory, TaskOwner, TaskStatus},
    ports::TaskFilter,
};
use rstest::rstest;

use super::helpers::{Stack, finish, stack};

const LAUNCH_PLAN: &str = "Launch billing
1. Add billing provider enum
2. Create API key for the sandbox
3. Wire checkout endpoint
4. Request code review from the team
5. Write integration tests
6. Deploy to production";

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn projects_keep_the_template_snapshot_they_started_with(stack: Stack) -> eyre::Result<()> {
    let rules = RoutingRules::new(
        vec![RoutingRule::new(TaskCategory::Docs, true)],
        vec![KeywordMatcher::new(TaskCategory::Docs, ["changelog"])?],
    )?;
    let template = stack
        .templates
        .create(
            CreateTemplateRequest::new("docs-review", rules)
                .with_version("v1")
                .as_default(),
        )
        .await?;
    let project_id = ProjectId::new("docs")?;
    let project = stack
        .projects
        .initialize(InitializeProjectRequest::new(project_id.clone(), "Docs"))
        .await?;
    eyre::ensure!(
        project.routing().template_id == Some(template.id()),
        "default template snapshotted"
    );

    stack
        .templates
        .revise(template.id(), "v2", RoutingRules::builtin())
        .await?;

    let decomposition = stack
        .decomposer
        .split_plan_to_tasks(
            &project_id,
            "Release\n1. Update the changelog\n2. Wire the export endpoint",
            None,
        )
        .await?;
    let owners: Vec<TaskOwner> = decomposition.tasks.iter().map(Task::owner).collect();
    eyre::ensure!(
        owners == vec![TaskOwner::Human, TaskOwner::Agent],
        "v1 rules still route the changelog to a human: {owners:?}"
    );
    let reloaded = stack.projects.get(&project_id).await?;
    eyre::ensure!(
        reloaded.routing().template_version == "v1",
        "snapshot version unchanged"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_decomposed_plan_runs_to_completion(stack: Stack) -> eyre::Result<()> {
    let project_id = ProjectId::new("billing")?;
    stack
        .projects
        .initialize(InitializeProjectRequest::new(project_id.clone(), "Billing"))
        .await?;
    let decomposition = stack
        .decomposer
        .split_plan_to_tasks(&project_id, LAUNCH_PLAN, None)
        .await?;

    let executable = TaskFilter::new()
        .for_project(project_id.clone())
        .with_status(TaskStatus::Ready)
        .with_status(TaskStatus::AwaitingHuman);
    let mut finished = Vec::new();
    loop {
        let next = stack.lifecycle.list_tasks(&executable).await?;
        eyre::ensure!(next.len() <= 1, "a chain exposes one step at a time");
        let Some(task) = next.first() else {
            break;
        };
        finish(&stack.lifecycle, task).await?;
        finished.push(task.id());
    }

    eyre::ensure!(
        finished == decomposition.task_ids(),
        "steps ran in plan order"
    );
    let all = stack
        .lifecycle
        .list_tasks(&TaskFilter::new().for_project(project_id))
        .await?;
    eyre::ensure!(
        all.iter().all(|task| task.status() == TaskStatus::Done),
        "every step done"
    );

    let last = decomposition
        .tasks
        .last()
        .ok_or_else(|| eyre::eyre!("plan produced no tasks"))?;
    let trail = stack.handoffs.list_by_task(last.id()).await?;
    eyre::ensure!(trail.len() == 2, "one inbound and one audit handoff");
    eyre::ensure!(
        trail.iter().any(|handoff| handoff.is_audit_only()),
        "final step leaves an audit record"
    );
    Ok(())
}
