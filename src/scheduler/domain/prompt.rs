//! Instructions handed to an external agent for one task.

use crate::task::domain::{MIN_HANDOFF_SUMMARY_CHARS, Task};

/// Builds the prompt passed to the agent for `task`.
///
/// The scheduler claims the task before dispatch, so the prompt only asks
/// the agent to do the work and report back.
#[must_use]
pub fn dispatch_prompt(task: &Task) -> String {
    let criteria = task
        .acceptance_criteria()
        .iter()
        .map(|criterion| format!("- {criterion}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Execute baton task {id} in project {project}: {title}\n\n\
         {description}\n\n\
         Acceptance criteria:\n{criteria}\n\n\
         The task is already claimed for you. When the work is done, complete \
         task {id} with its output and a handoff summary of at least \
         {MIN_HANDOFF_SUMMARY_CHARS} characters. If you need human input, \
         self-unblock it behind a human-owned task instead.",
        id = task.id(),
        project = task.project_id(),
        title = task.title(),
        description = task.description(),
    )
}
