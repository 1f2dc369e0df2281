//! Scheduler adapters: the shell command invoker and the config file
//! loader.

mod command;
mod config_file;

pub use command::{CommandInvoker, PROJECT_ID_ENV, TASK_ID_ENV, shell_quote};
pub use config_file::{load_worker_config, load_worker_config_from};
