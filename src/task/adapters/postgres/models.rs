//! Diesel row models for task and handoff persistence.

use super::schema::{handoffs, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row shape shared by task reads, inserts and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Owning project slug.
    pub project_id: String,
    /// Source plan.
    pub plan_id: Option<uuid::Uuid>,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Acceptance criteria JSON array.
    pub acceptance_criteria: Value,
    /// Category.
    pub category: String,
    /// Owner.
    pub owner: String,
    /// Status.
    pub status: String,
    /// Dependency id JSON array.
    pub depends_on: Value,
    /// Priority.
    pub priority: i32,
    /// Completion output.
    pub output: Option<String>,
    /// Log JSON array.
    pub logs: Value,
    /// Waiting reason.
    pub waiting_reason: Option<String>,
    /// Claim holder.
    pub claimed_by: Option<String>,
    /// Creator role.
    pub created_by: Option<String>,
    /// Stored revision.
    pub revision: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Row shape shared by handoff reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = handoffs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct HandoffRow {
    /// Handoff identifier.
    pub id: uuid::Uuid,
    /// Source task.
    pub from_task_id: uuid::Uuid,
    /// Recipient task.
    pub to_task_id: Option<uuid::Uuid>,
    /// Summary text.
    pub summary: String,
    /// Artifact JSON array.
    pub artifacts: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
