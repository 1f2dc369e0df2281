//! Worker configuration read from `.baton.json`.
//!
//! ```json
//! {
//!   "project": "billing",
//!   "agent": "claude -p",
//!   "agent_args_template": "{{prompt}}",
//!   "poll_interval_secs": 5
//! }
//! ```
//!
//! Every field is optional. Without `agent` the daemon polls but cannot
//! dispatch.

use super::WorkerConfigError;
use crate::project::domain::ProjectId;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// File name looked up in the working directory.
pub const WORKER_CONFIG_FILE: &str = ".baton.json";

/// Argument template used when none is configured.
pub const DEFAULT_ARGS_TEMPLATE: &str = "{{prompt}}";

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Settings for the polling worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Restricts dispatch to one project.
    #[serde(default)]
    pub project: Option<ProjectId>,
    /// Shell command prefix that runs the external agent.
    #[serde(default)]
    pub agent: Option<String>,
    /// `minijinja` template rendered into the agent's arguments.
    #[serde(default = "default_args_template")]
    pub agent_args_template: String,
    /// Seconds between scheduler ticks.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

fn default_args_template() -> String {
    DEFAULT_ARGS_TEMPLATE.to_owned()
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            project: None,
            agent: None,
            agent_args_template: default_args_template(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl WorkerConfig {
    /// Decodes and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerConfigError::Parse`] for malformed JSON and the
    /// validation errors of [`Self::validate`].
    pub fn from_json(document: &str) -> Result<Self, WorkerConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field values.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerConfigError`] for a blank agent, a blank or
    /// malformed template and a zero poll interval.
    pub fn validate(&self) -> Result<(), WorkerConfigError> {
        if self
            .agent
            .as_deref()
            .is_some_and(|agent| agent.trim().is_empty())
        {
            return Err(WorkerConfigError::EmptyAgent);
        }
        if self.agent_args_template.trim().is_empty() {
            return Err(WorkerConfigError::EmptyArgsTemplate);
        }
        Environment::new()
            .template_from_str(&self.agent_args_template)
            .map_err(WorkerConfigError::InvalidArgsTemplate)?;
        if self.poll_interval_secs == 0 {
            return Err(WorkerConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Returns the delay between scheduler ticks.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
