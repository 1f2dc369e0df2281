//! `PostgreSQL` integration tests for templates, projects and plans.

use std::sync::Arc;

use baton::plan::{
    ports::PlanRepository,
    services::{PlanDecomposer, PlanServiceError},
};
use baton::project::{
    domain::ProjectStatus,
    ports::{ProjectRepository, ProjectRepositoryError},
};
use baton::routing::{
    domain::{RoutingRules, RoutingTemplate},
    ports::TemplateRepository,
};
use baton::task::domain::TaskOwner;
use mockable::DefaultClock;
use rstest::rstest;

use super::helpers::{BoxError, pg_stack};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_keeps_a_single_default_template() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let mut first = RoutingTemplate::new("first", None, RoutingRules::builtin(), &DefaultClock)?;
    first.set_default(true, &DefaultClock);
    stack.templates.store(&first).await?;

    let mut second = RoutingTemplate::new("second", None, RoutingRules::builtin(), &DefaultClock)?;
    second.set_default(true, &DefaultClock);
    stack.templates.store(&second).await?;

    let default = stack.templates.find_default().await?.ok_or("no default")?;
    assert_eq!(default.id(), second.id());
    let defaults = stack
        .templates
        .list()
        .await?
        .into_iter()
        .filter(RoutingTemplate::is_default)
        .count();
    assert_eq!(defaults, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_persists_project_archive() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("alpha").await?;
    let mut project = stack
        .projects
        .find_by_id(&project_id)
        .await?
        .ok_or("project not stored")?;
    project.archive(&DefaultClock)?;
    stack.projects.update(&project).await?;

    let reloaded = stack
        .projects
        .find_by_id(&project_id)
        .await?
        .ok_or("project not stored")?;
    assert_eq!(reloaded.status(), ProjectStatus::Archived);
    assert_eq!(reloaded.routing(), project.routing());

    let duplicate = stack.projects.store(&project).await;
    assert!(matches!(
        duplicate,
        Err(ProjectRepositoryError::DuplicateProject(_))
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn postgres_split_plan_persists_chain() -> Result<(), BoxError> {
    let stack = pg_stack().await?;
    let project_id = stack.add_project("billing").await?;
    let decomposer = PlanDecomposer::new(
        Arc::clone(&stack.plans),
        Arc::clone(&stack.tasks),
        Arc::clone(&stack.projects),
        Arc::new(DefaultClock),
    );

    let decomposition = decomposer
        .split_plan_to_tasks(
            &project_id,
            "Launch\n1. Add provider enum\n2. Create API key for the sandbox",
            None,
        )
        .await?;
    let stored = decomposer.plan_tasks(decomposition.plan.id()).await?;
    let stored_ids: Vec<_> = stored.iter().map(|task| task.id()).collect();
    assert_eq!(stored_ids, decomposition.task_ids());
    let owners: Vec<TaskOwner> = stored.iter().map(|task| task.owner()).collect();
    assert_eq!(owners, vec![TaskOwner::Agent, TaskOwner::Human]);

    let plans = stack.plans.list_by_project(&project_id).await?;
    let plan_ids: Vec<_> = plans.iter().map(|plan| plan.id()).collect();
    assert_eq!(plan_ids, vec![decomposition.plan.id()]);

    let deletion = decomposer.delete_plan(decomposition.plan.id()).await;
    assert!(matches!(
        deletion,
        Err(PlanServiceError::PlanInUse { task_count: 2, .. })
    ));
    Ok(())
}
