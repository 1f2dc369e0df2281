//! Given steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use baton::project::{domain::ProjectId, services::InitializeProjectRequest};
use baton::task::{domain::TaskOwner, services::CreateTaskRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a project "{slug}""#)]
fn a_project(world: &mut OrchestrationWorld, slug: String) -> Result<(), eyre::Report> {
    let project_id = ProjectId::new(slug.as_str())?;
    run_async(
        world
            .projects
            .initialize(InitializeProjectRequest::new(project_id.clone(), slug)),
    )
    .wrap_err("initialise scenario project")?;
    world.project_id = Some(project_id);
    Ok(())
}

fn create_task(
    world: &mut OrchestrationWorld,
    title: &str,
    owner: TaskOwner,
    depends_on: Option<&str>,
) -> Result<(), eyre::Report> {
    let dependencies = depends_on.map(|dep| world.task(dep)).transpose()?;
    let request = CreateTaskRequest::new(
        world.project()?,
        title,
        format!("{title} for the scenario"),
        [format!("{title} is finished")],
    )
    .with_owner(owner)
    .with_dependencies(dependencies);
    let created =
        run_async(world.lifecycle.create_task(request)).wrap_err("create scenario task")?;
    world.task_ids.insert(title.to_owned(), created.id());
    Ok(())
}

#[given(r#"an agent task "{title}""#)]
fn agent_task(world: &mut OrchestrationWorld, title: String) -> Result<(), eyre::Report> {
    create_task(world, &title, TaskOwner::Agent, None)
}

#[given(r#"a human task "{title}""#)]
fn human_task(world: &mut OrchestrationWorld, title: String) -> Result<(), eyre::Report> {
    create_task(world, &title, TaskOwner::Human, None)
}

#[given(r#"a dependent agent task "{title}" after "{dependency}""#)]
fn dependent_agent_task(
    world: &mut OrchestrationWorld,
    title: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    create_task(world, &title, TaskOwner::Agent, Some(&dependency))
}

#[given(r#"a dependent human task "{title}" after "{dependency}""#)]
fn dependent_human_task(
    world: &mut OrchestrationWorld,
    title: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    create_task(world, &title, TaskOwner::Human, Some(&dependency))
}
