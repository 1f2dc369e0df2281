//! Diesel row models for plan persistence.

use super::schema::plans;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlanRow {
    pub id: uuid::Uuid,
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
