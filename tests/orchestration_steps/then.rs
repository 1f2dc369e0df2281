//! Then steps for orchestration BDD scenarios.

use super::world::{OrchestrationWorld, run_async};
use baton::task::domain::{Task, TaskOwner, TaskStatus};
use rstest_bdd_macros::then;

#[then(r#"task "{title}" is "{status}""#)]
fn task_status_is(
    world: &OrchestrationWorld,
    title: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = run_async(world.lifecycle.get_task(world.task(&title)?))?;
    eyre::ensure!(
        task.status() == expected,
        "expected {title} to be {}, found {}",
        expected.as_str(),
        task.status().as_str()
    );
    Ok(())
}

#[then(r#"task "{title}" has {count:u64} inbound handoff"#)]
fn inbound_handoffs(
    world: &OrchestrationWorld,
    title: String,
    count: u64,
) -> Result<(), eyre::Report> {
    let handoffs = run_async(world.handoffs.inbound(world.task(&title)?))?;
    eyre::ensure!(
        u64::try_from(handoffs.len())? == count,
        "expected {count} inbound handoff(s), found {}",
        handoffs.len()
    );
    Ok(())
}

#[then("the last operation fails with exit code {code:i32}")]
fn last_operation_fails(world: &OrchestrationWorld, code: i32) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.last_exit_code == Some(code),
        "expected exit code {code}, found {:?}",
        world.last_exit_code
    );
    Ok(())
}

fn created(world: &OrchestrationWorld) -> Result<&[Task], eyre::Report> {
    world
        .decomposition
        .as_ref()
        .map(|decomposition| decomposition.tasks.as_slice())
        .ok_or_else(|| eyre::eyre!("no plan was split in this scenario"))
}

#[then("{count:u64} tasks are created")]
fn tasks_created(world: &OrchestrationWorld, count: u64) -> Result<(), eyre::Report> {
    let tasks = created(world)?;
    eyre::ensure!(
        u64::try_from(tasks.len())? == count,
        "expected {count} tasks, found {}",
        tasks.len()
    );
    Ok(())
}

#[then(r#"{count:u64} of them are owned by "{owner}""#)]
fn owned_by(world: &OrchestrationWorld, count: u64, owner: String) -> Result<(), eyre::Report> {
    let expected_owner = TaskOwner::try_from(owner.as_str())
        .map_err(|err| eyre::eyre!("invalid owner in scenario: {err}"))?;
    let owned = created(world)?
        .iter()
        .filter(|task| task.owner() == expected_owner)
        .count();
    eyre::ensure!(
        u64::try_from(owned)? == count,
        "expected {count} {owner} task(s), found {owned}"
    );
    Ok(())
}

#[then("only the first task is executable")]
fn only_first_executable(world: &OrchestrationWorld) -> Result<(), eyre::Report> {
    let executable: Vec<bool> = created(world)?
        .iter()
        .map(|task| task.status().is_executable())
        .collect();
    eyre::ensure!(
        executable.first() == Some(&true) && executable.iter().skip(1).all(|ready| !ready),
        "unexpected executability {executable:?}"
    );
    Ok(())
}
