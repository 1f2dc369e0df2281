//! Shared `PostgreSQL` plumbing for the Diesel-backed adapters.
//!
//! Every repository runs its synchronous Diesel work on the blocking thread
//! pool so the async executor's workers are never parked on I/O.

use diesel::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use thiserror::Error;

/// `PostgreSQL` connection pool shared by all adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Failure to reach the point where a repository closure runs.
#[derive(Debug, Error)]
pub enum BlockingError {
    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connections cannot be opened.
pub fn build_pool(database_url: &str) -> Result<PgPool, PoolError> {
    Pool::builder().build(ConnectionManager::<PgConnection>::new(database_url))
}

/// Checks out a connection and runs `f` on the blocking thread pool.
///
/// Pool and join failures are converted through `map_err`.
pub(crate) async fn run_blocking<F, T, E, M>(pool: &PgPool, map_err: M, f: F) -> Result<T, E>
where
    F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
    M: Fn(BlockingError) -> E + Send + Copy + 'static,
{
    let pool_handle = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = pool_handle
            .get()
            .map_err(|err| map_err(BlockingError::Pool(err)))?;
        f(&mut connection)
    })
    .await
    .map_err(|err| map_err(BlockingError::Join(err)))?
}
