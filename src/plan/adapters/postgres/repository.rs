//! `PostgreSQL` repository implementation for plans.

use super::{models::PlanRow, schema::plans};
use crate::persistence::{PgPool, run_blocking};
use crate::plan::{
    domain::{PersistedPlanData, Plan, PlanId},
    ports::{PlanRepository, PlanRepositoryError, PlanRepositoryResult},
};
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed plan repository.
#[derive(Debug, Clone)]
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn store(&self, plan: &Plan) -> PlanRepositoryResult<()> {
        let plan_id = plan.id();
        let row = PlanRow {
            id: plan.id().into_inner(),
            project_id: plan.project_id().as_str().to_owned(),
            title: plan.title().to_owned(),
            description: plan.description().to_owned(),
            created_at: plan.created_at(),
        };
        run_blocking(&self.pool, PlanRepositoryError::persistence, move |connection| {
            diesel::insert_into(plans::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        PlanRepositoryError::DuplicatePlan(plan_id)
                    }
                    _ => PlanRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: PlanId) -> PlanRepositoryResult<Option<Plan>> {
        run_blocking(&self.pool, PlanRepositoryError::persistence, move |connection| {
            plans::table
                .find(id.into_inner())
                .select(PlanRow::as_select())
                .first::<PlanRow>(connection)
                .optional()
                .map_err(PlanRepositoryError::persistence)?
                .map(row_to_plan)
                .transpose()
        })
        .await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> PlanRepositoryResult<Vec<Plan>> {
        let lookup = project_id.as_str().to_owned();
        run_blocking(&self.pool, PlanRepositoryError::persistence, move |connection| {
            plans::table
                .filter(plans::project_id.eq(lookup))
                .order(plans::created_at.asc())
                .select(PlanRow::as_select())
                .load::<PlanRow>(connection)
                .map_err(PlanRepositoryError::persistence)?
                .into_iter()
                .map(row_to_plan)
                .collect()
        })
        .await
    }

    async fn delete(&self, id: PlanId) -> PlanRepositoryResult<bool> {
        run_blocking(&self.pool, PlanRepositoryError::persistence, move |connection| {
            let deleted = diesel::delete(plans::table.find(id.into_inner()))
                .execute(connection)
                .map_err(PlanRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn row_to_plan(row: PlanRow) -> PlanRepositoryResult<Plan> {
    let project_id = ProjectId::new(row.project_id).map_err(PlanRepositoryError::persistence)?;
    Ok(Plan::from_persisted(PersistedPlanData {
        id: PlanId::from_uuid(row.id),
        project_id,
        title: row.title,
        description: row.description,
        created_at: row.created_at,
    }))
}
