//! Diesel row models for routing template persistence.

use super::schema::routing_templates;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for template records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = routing_templates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TemplateRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub version: String,
    pub rules: Value,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for template records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = routing_templates)]
pub struct NewTemplateRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub version: String,
    pub rules: Value,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
