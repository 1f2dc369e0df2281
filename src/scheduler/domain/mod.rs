//! Scheduler domain: worker configuration and dispatch prompts.

mod config;
mod error;
mod prompt;

pub use config::{
    DEFAULT_ARGS_TEMPLATE, DEFAULT_POLL_INTERVAL_SECS, WORKER_CONFIG_FILE, WorkerConfig,
};
pub use error::WorkerConfigError;
pub use prompt::dispatch_prompt;
