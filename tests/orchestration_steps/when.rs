//! When steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, detailed_summary, run_async};
use baton::task::{
    domain::TaskOwner,
    services::{
        CompleteTaskRequest, SelfUnblockRequest, TaskLifecycleError, TaskLifecycleResult,
    },
};
use eyre::WrapErr;
use rstest_bdd_macros::when;

fn parse_role(role: &str) -> Result<TaskOwner, eyre::Report> {
    TaskOwner::try_from(role).map_err(|err| eyre::eyre!("invalid role in scenario: {err}"))
}

fn record<T>(world: &mut OrchestrationWorld, result: TaskLifecycleResult<T>) {
    world.last_exit_code = result.err().as_ref().map(TaskLifecycleError::exit_code);
}

#[when(r#"the {role} claims "{title}""#)]
fn claims(world: &mut OrchestrationWorld, role: String, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task(&title)?;
    let result = run_async(world.lifecycle.claim(task_id, parse_role(&role)?, None));
    record(world, result);
    Ok(())
}

fn complete(
    world: &mut OrchestrationWorld,
    role: &str,
    title: &str,
    summary: String,
) -> Result<(), eyre::Report> {
    let task_id = world.task(title)?;
    let request = CompleteTaskRequest::new(task_id, parse_role(role)?, "scenario output", summary);
    let result = run_async(world.lifecycle.complete(request));
    record(world, result);
    Ok(())
}

#[when(r#"the {role} completes "{title}" with a detailed summary"#)]
fn completes_with_detail(
    world: &mut OrchestrationWorld,
    role: String,
    title: String,
) -> Result<(), eyre::Report> {
    complete(world, &role, &title, detailed_summary())
}

#[when(r#"the {role} completes "{title}" with summary "{summary}""#)]
fn completes_with_summary(
    world: &mut OrchestrationWorld,
    role: String,
    title: String,
    summary: String,
) -> Result<(), eyre::Report> {
    complete(world, &role, &title, summary)
}

#[when(r#"the agent self-unblocks "{title}" behind "{dependency}""#)]
fn self_unblocks(
    world: &mut OrchestrationWorld,
    title: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let request = SelfUnblockRequest::new(world.task(&title)?, [world.task(&dependency)?]);
    let result = run_async(world.lifecycle.self_unblock(request));
    record(world, result);
    Ok(())
}

fn split(world: &mut OrchestrationWorld, text: &str) -> Result<(), eyre::Report> {
    let project_id = world.project()?;
    let decomposition = run_async(world.decomposer.split_plan_to_tasks(&project_id, text, None))
        .wrap_err("split scenario plan")?;
    for task in &decomposition.tasks {
        world.task_ids.insert(task.title().to_owned(), task.id());
    }
    world.decomposition = Some(decomposition);
    Ok(())
}

#[when(r#"the plan "{title}" is split into "{steps}""#)]
fn plan_split_into(
    world: &mut OrchestrationWorld,
    title: String,
    steps: String,
) -> Result<(), eyre::Report> {
    let mut text = title;
    for (index, step) in steps.split(';').map(str::trim).enumerate() {
        text.push_str(&format!("\n{}. {step}", index + 1));
    }
    split(world, &text)
}

#[when(r#"the plan "{title}" is split without steps"#)]
fn plan_split_without_steps(
    world: &mut OrchestrationWorld,
    title: String,
) -> Result<(), eyre::Report> {
    split(world, &title)
}
