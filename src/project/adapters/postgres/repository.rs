//! `PostgreSQL` repository implementation for projects.

use super::{models::ProjectRow, schema::projects};
use crate::persistence::{PgPool, run_blocking};
use crate::project::{
    domain::{PersistedProjectData, Project, ProjectId, ProjectStatus, RoutingConfig},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id().clone();
        let row = to_row(project)?;
        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateProject(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id().clone();
        let row = to_row(project)?;
        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            let updated = diesel::update(projects::table.find(row.id.clone()))
                .set(&row)
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProjectRepositoryError::NotFound(project_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: &ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let lookup = id.as_str().to_owned();
        run_blocking(&self.pool, ProjectRepositoryError::persistence, move |connection| {
            projects::table
                .find(lookup)
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?
                .map(row_to_project)
                .transpose()
        })
        .await
    }

    async fn list(&self) -> ProjectRepositoryResult<Vec<Project>> {
        run_blocking(&self.pool, ProjectRepositoryError::persistence, |connection| {
            projects::table
                .order(projects::id.asc())
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)
                .map_err(ProjectRepositoryError::persistence)?
                .into_iter()
                .map(row_to_project)
                .collect()
        })
        .await
    }
}

fn to_row(project: &Project) -> ProjectRepositoryResult<ProjectRow> {
    let routing =
        serde_json::to_value(project.routing()).map_err(ProjectRepositoryError::persistence)?;
    Ok(ProjectRow {
        id: project.id().as_str().to_owned(),
        name: project.name().to_owned(),
        routing,
        status: project.status().as_str().to_owned(),
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    })
}

fn row_to_project(row: ProjectRow) -> ProjectRepositoryResult<Project> {
    let id = ProjectId::new(row.id).map_err(ProjectRepositoryError::persistence)?;
    let routing = serde_json::from_value::<RoutingConfig>(row.routing)
        .map_err(ProjectRepositoryError::persistence)?;
    let status =
        ProjectStatus::try_from(row.status.as_str()).map_err(ProjectRepositoryError::persistence)?;
    Ok(Project::from_persisted(PersistedProjectData {
        id,
        name: row.name,
        routing,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
