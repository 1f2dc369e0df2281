//! Port for handing a claimed task to an external executor.

use crate::task::domain::Task;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationOutcome {
    /// Process exit status; `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
}

impl InvocationOutcome {
    /// Creates an outcome from an exit status.
    #[must_use]
    pub const fn new(exit_code: Option<i32>) -> Self {
        Self { exit_code }
    }

    /// Returns `true` when the executor exited with status zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Errors raised while invoking an executor.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// No agent command is configured.
    #[error("no agent command configured")]
    NoAgentConfigured,

    /// The argument template failed to render.
    #[error("failed to render agent arguments: {0}")]
    Template(String),

    /// The executor process could not be started.
    #[error("failed to spawn agent `{command}`: {source}")]
    Spawn {
        /// Command prefix that failed to start.
        command: String,
        /// Underlying I/O failure.
        #[source]
        source: Arc<std::io::Error>,
    },
}

/// Runs a claimed task.
///
/// The call returns once the executor finishes. The executor reports the
/// task's result through the lifecycle operations, not through the return
/// value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskInvoker: Send + Sync {
    /// Checks that `task` can be handed to the executor, before it is
    /// claimed.
    ///
    /// # Errors
    ///
    /// Returns [`InvocationError`] when an invocation could not start.
    fn prepare(&self, task: &Task) -> Result<(), InvocationError>;

    /// Invokes the executor for `task`.
    async fn invoke(&self, task: &Task) -> Result<InvocationOutcome, InvocationError>;
}
