//! `PostgreSQL` repository implementation for routing templates.

use super::{
    models::{NewTemplateRow, TemplateRow},
    schema::routing_templates,
};
use crate::persistence::{PgPool, run_blocking};
use crate::routing::{
    domain::{PersistedTemplateData, RoutingRules, RoutingTemplate, TemplateId},
    ports::{TemplateRepository, TemplateRepositoryError, TemplateRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

impl From<DieselError> for TemplateRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed template repository.
#[derive(Debug, Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn store(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()> {
        let template_id = template.id();
        let row = to_row(template)?;
        run_blocking(&self.pool, TemplateRepositoryError::persistence, move |connection| {
            connection.transaction::<_, TemplateRepositoryError, _>(|conn| {
                if row.is_default {
                    clear_other_defaults(conn, row.id)?;
                }
                diesel::insert_into(routing_templates::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            TemplateRepositoryError::DuplicateTemplate(template_id)
                        }
                        _ => TemplateRepositoryError::persistence(err),
                    })?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()> {
        let template_id = template.id();
        let row = to_row(template)?;
        run_blocking(&self.pool, TemplateRepositoryError::persistence, move |connection| {
            connection.transaction::<_, TemplateRepositoryError, _>(|conn| {
                if row.is_default {
                    clear_other_defaults(conn, row.id)?;
                }
                let updated = diesel::update(routing_templates::table.find(row.id))
                    .set(&row)
                    .execute(conn)
                    .map_err(TemplateRepositoryError::persistence)?;
                if updated == 0 {
                    return Err(TemplateRepositoryError::NotFound(template_id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TemplateId) -> TemplateRepositoryResult<Option<RoutingTemplate>> {
        run_blocking(&self.pool, TemplateRepositoryError::persistence, move |connection| {
            routing_templates::table
                .find(id.into_inner())
                .select(TemplateRow::as_select())
                .first::<TemplateRow>(connection)
                .optional()
                .map_err(TemplateRepositoryError::persistence)?
                .map(row_to_template)
                .transpose()
        })
        .await
    }

    async fn find_default(&self) -> TemplateRepositoryResult<Option<RoutingTemplate>> {
        run_blocking(&self.pool, TemplateRepositoryError::persistence, |connection| {
            routing_templates::table
                .filter(routing_templates::is_default.eq(true))
                .select(TemplateRow::as_select())
                .first::<TemplateRow>(connection)
                .optional()
                .map_err(TemplateRepositoryError::persistence)?
                .map(row_to_template)
                .transpose()
        })
        .await
    }

    async fn list(&self) -> TemplateRepositoryResult<Vec<RoutingTemplate>> {
        run_blocking(&self.pool, TemplateRepositoryError::persistence, |connection| {
            routing_templates::table
                .order((
                    routing_templates::is_default.desc(),
                    routing_templates::name.asc(),
                ))
                .select(TemplateRow::as_select())
                .load::<TemplateRow>(connection)
                .map_err(TemplateRepositoryError::persistence)?
                .into_iter()
                .map(row_to_template)
                .collect()
        })
        .await
    }

    async fn delete(&self, id: TemplateId) -> TemplateRepositoryResult<bool> {
        run_blocking(&self.pool, TemplateRepositoryError::persistence, move |connection| {
            let deleted = diesel::delete(routing_templates::table.find(id.into_inner()))
                .execute(connection)
                .map_err(TemplateRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }
}

fn clear_other_defaults(
    connection: &mut PgConnection,
    keep: uuid::Uuid,
) -> TemplateRepositoryResult<()> {
    diesel::update(
        routing_templates::table
            .filter(routing_templates::is_default.eq(true))
            .filter(routing_templates::id.ne(keep)),
    )
    .set(routing_templates::is_default.eq(false))
    .execute(connection)
    .map_err(TemplateRepositoryError::persistence)?;
    Ok(())
}

fn to_row(template: &RoutingTemplate) -> TemplateRepositoryResult<NewTemplateRow> {
    let rules =
        serde_json::to_value(template.rules()).map_err(TemplateRepositoryError::persistence)?;
    Ok(NewTemplateRow {
        id: template.id().into_inner(),
        name: template.name().to_owned(),
        version: template.version().to_owned(),
        rules,
        is_default: template.is_default(),
        created_at: template.created_at(),
        updated_at: template.updated_at(),
    })
}

fn row_to_template(row: TemplateRow) -> TemplateRepositoryResult<RoutingTemplate> {
    let rules = serde_json::from_value::<RoutingRules>(row.rules)
        .map_err(TemplateRepositoryError::persistence)?;
    Ok(RoutingTemplate::from_persisted(PersistedTemplateData {
        id: TemplateId::from_uuid(row.id),
        name: row.name,
        version: row.version,
        rules,
        is_default: row.is_default,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
