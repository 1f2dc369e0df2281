//! Polls the task store and dispatches ready agent tasks.
//!
//! Usage:
//!
//! ```text
//! BATON_DATABASE_URL=postgres://localhost/baton baton-daemon [workdir]
//! ```
//!
//! Worker settings are read from `.baton.json` in `workdir` (default: the
//! current directory). The agent command also runs from `workdir`. Without
//! an `agent` entry the daemon exits with an error instead of claiming work
//! it cannot hand off.
//!
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use baton::persistence::build_pool;
use baton::project::adapters::postgres::PostgresProjectRepository;
use baton::scheduler::{
    adapters::{CommandInvoker, load_worker_config_from},
    services::Scheduler,
};
use baton::task::{adapters::postgres::PostgresTaskRepository, services::TaskLifecycleService};
use camino::Utf8PathBuf;
use mockable::DefaultClock;
use std::env;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DATABASE_URL_ENV: &str = "BATON_DATABASE_URL";

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum DaemonError {
    #[error("{DATABASE_URL_ENV} is not set")]
    MissingDatabaseUrl,
    #[error("working directory argument is not valid UTF-8")]
    NonUtf8WorkDir,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_tracing();

    let workdir = working_dir()?;
    let config = load_worker_config_from(&workdir)?;
    let invoker = CommandInvoker::from_config(&config)?.with_working_dir(workdir.clone());
    let database_url = env::var(DATABASE_URL_ENV).map_err(|_| DaemonError::MissingDatabaseUrl)?;
    let pool = build_pool(&database_url)?;

    let lifecycle = TaskLifecycleService::new(
        Arc::new(PostgresTaskRepository::new(pool.clone())),
        Arc::new(PostgresProjectRepository::new(pool)),
        Arc::new(DefaultClock),
    );
    let mut scheduler = Scheduler::new(lifecycle, Arc::new(invoker), config.poll_interval());
    if let Some(project_id) = config.project {
        scheduler = scheduler.for_project(project_id);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received; finishing current tick"),
            Err(err) => warn!(error = %err, "failed to listen for interrupt"),
        }
        shutdown_tx.send_replace(true);
    });

    info!(workdir = %workdir, "baton daemon started");
    scheduler.run(shutdown_rx).await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    drop(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    );
}

fn working_dir() -> Result<Utf8PathBuf, DaemonError> {
    env::args_os().nth(1).map_or_else(
        || Ok(Utf8PathBuf::from(".")),
        |arg| {
            arg.into_string()
                .map(Utf8PathBuf::from)
                .map_err(|_| DaemonError::NonUtf8WorkDir)
        },
    )
}
