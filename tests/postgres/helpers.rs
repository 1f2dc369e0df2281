//! Shared helpers for `PostgreSQL` integration tests.
//!
//! Each test gets its own freshly migrated database on the shared server,
//! dropped again afterwards.

use std::sync::Arc;

use baton::persistence::PgPool;
use baton::plan::adapters::postgres::PostgresPlanRepository;
use baton::project::{
    adapters::postgres::PostgresProjectRepository,
    domain::{Project, ProjectId, RoutingConfig},
    ports::ProjectRepository,
};
use baton::routing::adapters::postgres::PostgresTemplateRepository;
use baton::task::{adapters::postgres::PostgresTaskRepository, services::TaskLifecycleService};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use uuid::Uuid;

pub use super::server::BoxError;
use super::server::{TestServer, shared_server};

/// SQL creating the orchestration schema.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_orchestration_tables/up.sql");

/// A migrated database that is dropped with the value.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    pool: PgPool,
}

impl TemporaryDatabase {
    /// Returns a pool connected to the temporary database.
    #[must_use]
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        if let Ok(mut conn) = PgConnection::establish(&self.admin_url) {
            let sql = format!(
                "DROP DATABASE IF EXISTS {} WITH (FORCE)",
                quote_identifier(&self.name)
            );
            drop(diesel::sql_query(sql).execute(&mut conn));
        }
    }
}

/// Creates and migrates a database on the shared server.
///
/// # Errors
///
/// Returns an error when the server rejects the connection or migration.
pub async fn temporary_database() -> Result<TemporaryDatabase, BoxError> {
    tokio::task::spawn_blocking(|| create_database(shared_server())).await?
}

fn create_database(server: &TestServer) -> Result<TemporaryDatabase, BoxError> {
    let name = format!("baton_test_{}", Uuid::new_v4().simple());
    let admin_url = server.admin_url()?;
    let mut admin = PgConnection::establish(&admin_url)?;
    diesel::sql_query(format!("CREATE DATABASE {}", quote_identifier(&name))).execute(&mut admin)?;

    let url = server.database_url(&name)?;
    let mut conn = PgConnection::establish(&url)?;
    conn.batch_execute(CREATE_SCHEMA_SQL)?;

    let pool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    Ok(TemporaryDatabase {
        admin_url,
        name,
        pool,
    })
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Every `PostgreSQL` repository over one temporary database.
pub struct PgStack {
    pub database: TemporaryDatabase,
    pub tasks: Arc<PostgresTaskRepository>,
    pub projects: Arc<PostgresProjectRepository>,
    pub plans: Arc<PostgresPlanRepository>,
    pub templates: Arc<PostgresTemplateRepository>,
}

impl PgStack {
    /// Builds a lifecycle service over the stack's repositories.
    #[must_use]
    pub fn lifecycle(
        &self,
    ) -> TaskLifecycleService<PostgresTaskRepository, PostgresProjectRepository, DefaultClock> {
        TaskLifecycleService::new(
            Arc::clone(&self.tasks),
            Arc::clone(&self.projects),
            Arc::new(DefaultClock),
        )
    }

    /// Stores an active project with the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns an error when the slug is invalid or the insert fails.
    pub async fn add_project(&self, slug: &str) -> Result<ProjectId, BoxError> {
        let project_id = ProjectId::new(slug)?;
        let project = Project::new(
            project_id.clone(),
            slug,
            RoutingConfig::builtin(),
            &DefaultClock,
        )?;
        self.projects.store(&project).await?;
        Ok(project_id)
    }
}

/// Builds a stack over a fresh database.
///
/// # Errors
///
/// Returns an error when database creation fails.
pub async fn pg_stack() -> Result<PgStack, BoxError> {
    let database = temporary_database().await?;
    let pool = database.pool();
    Ok(PgStack {
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        projects: Arc::new(PostgresProjectRepository::new(pool.clone())),
        plans: Arc::new(PostgresPlanRepository::new(pool.clone())),
        templates: Arc::new(PostgresTemplateRepository::new(pool)),
        database,
    })
}
