//! The `PostgreSQL` server shared by every integration test in the run.
//!
//! `BATON_TEST_DATABASE_URL` selects an existing server. Otherwise an
//! embedded cluster is booted once through `pg-embed-setup-unpriv`; when
//! running as root that needs `PG_EMBEDDED_WORKER`. A server that cannot be
//! reached fails the test rather than letting it pass unexercised.

use std::ffi::OsString;
use std::net::TcpListener;
use std::sync::OnceLock;
use std::time::Duration;

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker,
};
use pg_embedded_setup_unpriv::{ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use tokio::runtime::Runtime;

/// Boxed error type for test helpers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Environment variable naming an existing test server.
pub const DATABASE_URL_ENV: &str = "BATON_TEST_DATABASE_URL";

static SHARED_SERVER: OnceLock<TestServer> = OnceLock::new();

/// Where the test databases live.
pub enum TestServer {
    /// A server named by [`DATABASE_URL_ENV`].
    External { admin_url: String },
    /// A cluster booted for this test run.
    Embedded(EmbeddedCluster),
}

impl TestServer {
    /// Connection URL for `database` on this server.
    ///
    /// # Errors
    ///
    /// Returns an error when the external URL has no database segment.
    pub fn database_url(&self, database: &str) -> Result<String, BoxError> {
        match self {
            Self::External { admin_url } => {
                let (base, _) = admin_url
                    .rsplit_once('/')
                    .ok_or_else(|| format!("{DATABASE_URL_ENV} must end in a database name"))?;
                Ok(format!("{base}/{database}"))
            }
            Self::Embedded(cluster) => Ok(cluster.bootstrap.settings.url(database)),
        }
    }

    /// Connection URL for the maintenance database.
    ///
    /// # Errors
    ///
    /// Returns an error when the external URL has no database segment.
    pub fn admin_url(&self) -> Result<String, BoxError> {
        match self {
            Self::External { admin_url } => Ok(admin_url.clone()),
            Self::Embedded(_) => self.database_url("postgres"),
        }
    }
}

/// Returns the server for this run, starting it on first use.
///
/// # Panics
///
/// Panics when no external server is configured and the embedded cluster
/// cannot be started.
pub fn shared_server() -> &'static TestServer {
    SHARED_SERVER.get_or_init(|| {
        if let Ok(admin_url) = std::env::var(DATABASE_URL_ENV) {
            return TestServer::External { admin_url };
        }
        match boot_embedded() {
            Ok(cluster) => TestServer::Embedded(cluster),
            Err(err) => panic!(
                "SKIP-TEST-CLUSTER: failed to start embedded PostgreSQL ({err}); \
                 set {DATABASE_URL_ENV} to use an existing server"
            ),
        }
    })
}

// The cluster owns a runtime of its own, so it is built off the test's
// runtime thread.
fn boot_embedded() -> Result<EmbeddedCluster, BoxError> {
    std::thread::spawn(EmbeddedCluster::start)
        .join()
        .map_err(|_| BoxError::from("embedded cluster bootstrap panicked"))?
}

/// An embedded cluster kept alive for the rest of the run.
pub struct EmbeddedCluster {
    bootstrap: TestBootstrapSettings,
    _runtime: Option<Runtime>,
    _postgres: Option<PostgreSQL>,
}

impl EmbeddedCluster {
    fn start() -> Result<Self, BoxError> {
        let mut bootstrap = bootstrap_for_tests().map_err(|err| Box::new(err) as BoxError)?;
        if std::env::var_os("PG_PORT").is_none() {
            bootstrap.settings.port = free_port()?;
        }
        sync_password_from_file(&mut bootstrap.settings)?;
        match bootstrap.privileges {
            ExecutionPrivileges::Unprivileged => Self::start_in_process(bootstrap),
            ExecutionPrivileges::Root => Self::start_via_worker(bootstrap),
        }
    }

    fn start_in_process(mut bootstrap: TestBootstrapSettings) -> Result<Self, BoxError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let env = ScopedEnv::apply(&bootstrap.environment.to_env());
        let mut postgres = PostgreSQL::new(bootstrap.settings.clone());
        let started = runtime.block_on(async {
            postgres
                .setup()
                .await
                .map_err(|err| Box::new(err) as BoxError)?;
            if !matches!(postgres.status(), Status::Started) {
                postgres
                    .start()
                    .await
                    .map_err(|err| Box::new(err) as BoxError)?;
            }
            Ok::<(), BoxError>(())
        });
        drop(env);
        started?;

        bootstrap.settings = postgres.settings().clone();
        sync_port_from_pid(&mut bootstrap.settings)?;
        Ok(Self {
            bootstrap,
            _runtime: Some(runtime),
            _postgres: Some(postgres),
        })
    }

    fn start_via_worker(mut bootstrap: TestBootstrapSettings) -> Result<Self, BoxError> {
        run_worker_operation(&bootstrap, WorkerOperation::Setup, bootstrap.setup_timeout)?;
        run_worker_operation(&bootstrap, WorkerOperation::Start, bootstrap.start_timeout)?;
        sync_port_from_pid(&mut bootstrap.settings)?;
        Ok(Self {
            bootstrap,
            _runtime: None,
            _postgres: None,
        })
    }
}

fn run_worker_operation(
    bootstrap: &TestBootstrapSettings,
    operation: WorkerOperation,
    timeout: Duration,
) -> Result<(), BoxError> {
    let worker = bootstrap.worker_binary.as_ref().ok_or_else(|| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "running as root needs PG_EMBEDDED_WORKER to name a worker binary",
        )) as BoxError
    })?;
    let env_vars = bootstrap.environment.to_env();
    let args = WorkerRequestArgs {
        worker: worker.as_path(),
        settings: &bootstrap.settings,
        env_vars: &env_vars,
        operation,
        timeout,
    };
    run_worker(&WorkerRequest::new(args)).map_err(|err| Box::new(err) as BoxError)
}

fn free_port() -> Result<u16, BoxError> {
    let listener = TcpListener::bind(("127.0.0.1", 0))?;
    Ok(listener.local_addr()?.port())
}

fn sync_password_from_file(settings: &mut Settings) -> Result<(), BoxError> {
    let raw_path = settings.password_file.to_string_lossy().into_owned();
    let path = Utf8Path::new(&raw_path);
    let (Some(parent), Some(file_name)) = (path.parent(), path.file_name()) else {
        return Ok(());
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    match dir.read_to_string(file_name) {
        Ok(contents) => {
            let password = contents.trim_end();
            if !password.is_empty() {
                password.clone_into(&mut settings.password);
            }
            Ok(())
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(Box::new(err)),
    }
}

// The fourth line of `postmaster.pid` holds the port the server bound.
fn sync_port_from_pid(settings: &mut Settings) -> Result<(), BoxError> {
    let data_dir = settings.data_dir.to_string_lossy().into_owned();
    let dir = Dir::open_ambient_dir(Utf8Path::new(&data_dir), ambient_authority())?;
    let contents = match dir.read_to_string("postmaster.pid") {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(Box::new(err)),
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}

/// Environment overrides restored when dropped.
struct ScopedEnv {
    saved: Vec<(String, Option<OsString>)>,
}

impl ScopedEnv {
    fn apply(vars: &[(String, Option<String>)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, value)| {
                let previous = std::env::var_os(key);
                set_or_remove(key, value.as_deref().map(OsString::from));
                (key.clone(), previous)
            })
            .collect();
        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            set_or_remove(&key, previous);
        }
    }
}

fn set_or_remove(key: &str, value: Option<OsString>) {
    // SAFETY: only called while the shared server is initialised, when every
    // other test thread is parked on the `OnceLock`.
    unsafe {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TestServer;
    use eyre::ensure;
    use rstest::rstest;

    #[rstest]
    #[case::with_database("postgres://u:p@db:5432/postgres", "postgres://u:p@db:5432/baton_x")]
    #[case::trailing_slash("postgres://u:p@db:5432/", "postgres://u:p@db:5432/baton_x")]
    fn external_urls_swap_the_database(
        #[case] admin_url: &str,
        #[case] expected: &str,
    ) -> eyre::Result<()> {
        let server = TestServer::External {
            admin_url: admin_url.to_owned(),
        };
        let url = server.database_url("baton_x").map_err(|err| eyre::eyre!("{err}"))?;
        ensure!(url == expected, "unexpected url {url}");
        Ok(())
    }

    #[test]
    fn external_url_without_path_is_rejected() {
        let server = TestServer::External {
            admin_url: "postgres:".to_owned(),
        };
        assert!(server.database_url("baton_x").is_err());
    }
}
