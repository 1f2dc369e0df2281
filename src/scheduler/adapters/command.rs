//! Shell command invoker.

use crate::scheduler::{
    domain::{WorkerConfig, dispatch_prompt},
    ports::{InvocationError, InvocationOutcome, TaskInvoker},
};
use crate::task::domain::Task;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use minijinja::{Environment, context};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::debug;

/// Environment variable carrying the dispatched task id.
pub const TASK_ID_ENV: &str = "BATON_TASK_ID";

/// Environment variable carrying the dispatched task's project.
pub const PROJECT_ID_ENV: &str = "BATON_PROJECT_ID";

/// Quotes `value` as one POSIX shell word.
///
/// Embedded single quotes become `'\''`.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Runs `sh -c "<agent> <rendered arguments>"` for each task.
///
/// The argument template sees `task_id`, `project_id`, `title` and `prompt`,
/// each already shell-quoted.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    agent: String,
    args_template: String,
    working_dir: Option<Utf8PathBuf>,
}

impl CommandInvoker {
    /// Creates an invoker for an agent command and argument template.
    #[must_use]
    pub fn new(agent: impl Into<String>, args_template: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            args_template: args_template.into(),
            working_dir: None,
        }
    }

    /// Builds an invoker from worker configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::NoAgentConfigured`] when the configuration
    /// names no agent.
    pub fn from_config(config: &WorkerConfig) -> Result<Self, InvocationError> {
        let agent = config
            .agent
            .as_deref()
            .ok_or(InvocationError::NoAgentConfigured)?;
        Ok(Self::new(agent, config.agent_args_template.as_str()))
    }

    /// Runs the agent from `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Renders the full shell command line for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError::Template`] when the template is invalid.
    pub fn render_command(&self, task: &Task) -> Result<String, InvocationError> {
        let env = Environment::new();
        let args = env
            .render_str(
                &self.args_template,
                context! {
                    task_id => shell_quote(&task.id().to_string()),
                    project_id => shell_quote(task.project_id().as_str()),
                    title => shell_quote(task.title()),
                    prompt => shell_quote(&dispatch_prompt(task)),
                },
            )
            .map_err(|err| InvocationError::Template(err.to_string()))?;
        let trimmed = args.trim();
        if trimmed.is_empty() {
            Ok(self.agent.clone())
        } else {
            Ok(format!("{} {trimmed}", self.agent))
        }
    }
}

#[async_trait]
impl TaskInvoker for CommandInvoker {
    fn prepare(&self, task: &Task) -> Result<(), InvocationError> {
        self.render_command(task).map(drop)
    }

    async fn invoke(&self, task: &Task) -> Result<InvocationOutcome, InvocationError> {
        let command_line = self.render_command(task)?;
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&command_line)
            .env(TASK_ID_ENV, task.id().to_string())
            .env(PROJECT_ID_ENV, task.project_id().as_str())
            .stdin(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(task_id = %task.id(), agent = %self.agent, "spawning agent");
        let status = command
            .status()
            .await
            .map_err(|source| InvocationError::Spawn {
                command: self.agent.clone(),
                source: Arc::new(source),
            })?;
        Ok(InvocationOutcome::new(status.code()))
    }
}
