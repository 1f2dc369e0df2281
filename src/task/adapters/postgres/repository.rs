//! `PostgreSQL` repository implementation for task lifecycle persistence.
//!
//! Commits lock every updated or guarded row with `SELECT ... FOR UPDATE`
//! in ascending id order, compare revisions, then apply inserts, updates
//! and handoffs inside the same transaction.

use super::{
    models::{HandoffRow, TaskRow},
    schema::{handoffs, tasks},
};
use crate::persistence::{PgPool, run_blocking};
use crate::plan::domain::PlanId;
use crate::project::domain::ProjectId;
use crate::task::{
    domain::{
        Handoff, HandoffArtifact, HandoffId, PersistedHandoffData, PersistedTaskData, Task,
        TaskCategory, TaskId, TaskOwner, TaskStatus,
    },
    ports::{
        HandoffRepository, TaskChangeSet, TaskFilter, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeMap;

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed task and handoff repository.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct PreparedChanges {
    expected: BTreeMap<uuid::Uuid, u64>,
    inserts: Vec<TaskRow>,
    updates: Vec<TaskRow>,
    handoffs: Vec<HandoffRow>,
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        run_blocking(&self.pool, TaskRepositoryError::persistence, move |connection| {
            tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?
                .map(row_to_task)
                .transpose()
        })
        .await
    }

    async fn list(&self, filter: &TaskFilter) -> TaskRepositoryResult<Vec<Task>> {
        let criteria = filter.clone();
        run_blocking(&self.pool, TaskRepositoryError::persistence, move |connection| {
            let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();
            if let Some(project_id) = criteria.project_id() {
                query = query.filter(tasks::project_id.eq(project_id.as_str().to_owned()));
            }
            if let Some(plan_id) = criteria.plan_id() {
                query = query.filter(tasks::plan_id.eq(plan_id.into_inner()));
            }
            if !criteria.statuses().is_empty() {
                let statuses: Vec<&str> =
                    criteria.statuses().iter().map(|status| status.as_str()).collect();
                query = query.filter(tasks::status.eq_any(statuses));
            }
            if let Some(owner) = criteria.owner() {
                query = query.filter(tasks::owner.eq(owner.as_str()));
            }
            if let Some(category) = criteria.category() {
                query = query.filter(tasks::category.eq(category.as_str()));
            }
            query
                .order((
                    tasks::priority.desc(),
                    tasks::created_at.asc(),
                    tasks::id.asc(),
                ))
                .load::<TaskRow>(connection)?
                .into_iter()
                .map(row_to_task)
                .collect()
        })
        .await
    }

    async fn commit(&self, changes: &TaskChangeSet) -> TaskRepositoryResult<()> {
        let prepared = prepare(changes)?;
        run_blocking(&self.pool, TaskRepositoryError::persistence, move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|conn| {
                check_revisions(conn, &prepared.expected)?;
                for row in &prepared.inserts {
                    insert_task(conn, row)?;
                }
                for row in &prepared.updates {
                    diesel::update(tasks::table.find(row.id))
                        .set(row)
                        .execute(conn)?;
                }
                if !prepared.handoffs.is_empty() {
                    diesel::insert_into(handoffs::table)
                        .values(&prepared.handoffs)
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl HandoffRepository for PostgresTaskRepository {
    async fn list_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Handoff>> {
        run_blocking(&self.pool, TaskRepositoryError::persistence, move |connection| {
            let id = task_id.into_inner();
            handoffs::table
                .filter(
                    handoffs::from_task_id
                        .eq(id)
                        .or(handoffs::to_task_id.eq(id)),
                )
                .order((handoffs::created_at.desc(), handoffs::id.asc()))
                .select(HandoffRow::as_select())
                .load::<HandoffRow>(connection)?
                .into_iter()
                .map(row_to_handoff)
                .collect()
        })
        .await
    }
}

fn prepare(changes: &TaskChangeSet) -> TaskRepositoryResult<PreparedChanges> {
    let mut expected = BTreeMap::new();
    for task in changes.updates() {
        expected.insert(task.id().into_inner(), task.revision());
    }
    for guard in changes.guards() {
        expected.insert(guard.task_id.into_inner(), guard.revision);
    }
    let inserts = changes
        .inserts()
        .iter()
        .map(|task| to_row(task, task.revision()))
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    let updates = changes
        .updates()
        .iter()
        .map(|task| to_row(task, task.revision() + 1))
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    let handoff_rows = changes
        .handoffs()
        .iter()
        .map(to_handoff_row)
        .collect::<TaskRepositoryResult<Vec<_>>>()?;
    Ok(PreparedChanges {
        expected,
        inserts,
        updates,
        handoffs: handoff_rows,
    })
}

fn check_revisions(
    connection: &mut PgConnection,
    expected: &BTreeMap<uuid::Uuid, u64>,
) -> TaskRepositoryResult<()> {
    if expected.is_empty() {
        return Ok(());
    }
    let ids: Vec<uuid::Uuid> = expected.keys().copied().collect();
    let locked: BTreeMap<uuid::Uuid, i64> = tasks::table
        .filter(tasks::id.eq_any(&ids))
        .order(tasks::id.asc())
        .select((tasks::id, tasks::revision))
        .for_update()
        .load::<(uuid::Uuid, i64)>(connection)?
        .into_iter()
        .collect();
    for (id, revision) in expected {
        let task_id = TaskId::from_uuid(*id);
        let stored = locked
            .get(id)
            .ok_or(TaskRepositoryError::NotFound(task_id))?;
        let actual = u64::try_from(*stored).map_err(TaskRepositoryError::persistence)?;
        if actual != *revision {
            return Err(TaskRepositoryError::Conflict {
                task_id,
                expected: *revision,
                actual,
            });
        }
    }
    Ok(())
}

fn insert_task(connection: &mut PgConnection, row: &TaskRow) -> TaskRepositoryResult<()> {
    diesel::insert_into(tasks::table)
        .values(row)
        .execute(connection)
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                TaskRepositoryError::DuplicateTask(TaskId::from_uuid(row.id))
            }
            _ => TaskRepositoryError::persistence(err),
        })?;
    Ok(())
}

fn to_row(task: &Task, revision: u64) -> TaskRepositoryResult<TaskRow> {
    let depends_on: Vec<uuid::Uuid> = task
        .depends_on()
        .iter()
        .map(|id| id.into_inner())
        .collect();
    Ok(TaskRow {
        id: task.id().into_inner(),
        project_id: task.project_id().as_str().to_owned(),
        plan_id: task.plan_id().map(PlanId::into_inner),
        title: task.title().to_owned(),
        description: task.description().to_owned(),
        acceptance_criteria: serde_json::to_value(task.acceptance_criteria())
            .map_err(TaskRepositoryError::persistence)?,
        category: task.category().as_str().to_owned(),
        owner: task.owner().as_str().to_owned(),
        status: task.status().as_str().to_owned(),
        depends_on: serde_json::to_value(depends_on).map_err(TaskRepositoryError::persistence)?,
        priority: task.priority(),
        output: task.output().map(ToOwned::to_owned),
        logs: serde_json::to_value(task.logs()).map_err(TaskRepositoryError::persistence)?,
        waiting_reason: task.waiting_reason().map(ToOwned::to_owned),
        claimed_by: task.claimed_by().map(|owner| owner.as_str().to_owned()),
        created_by: task.created_by().map(ToOwned::to_owned),
        revision: i64::try_from(revision).map_err(TaskRepositoryError::persistence)?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let project_id =
        ProjectId::try_from(row.project_id).map_err(TaskRepositoryError::persistence)?;
    let category =
        TaskCategory::try_from(row.category.as_str()).map_err(TaskRepositoryError::persistence)?;
    let owner = TaskOwner::try_from(row.owner.as_str()).map_err(TaskRepositoryError::persistence)?;
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(TaskRepositoryError::persistence)?;
    let claimed_by = row
        .claimed_by
        .as_deref()
        .map(TaskOwner::try_from)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    let depends_on = serde_json::from_value::<Vec<uuid::Uuid>>(row.depends_on)
        .map_err(TaskRepositoryError::persistence)?
        .into_iter()
        .map(TaskId::from_uuid)
        .collect();
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        project_id,
        plan_id: row.plan_id.map(PlanId::from_uuid),
        title: row.title,
        description: row.description,
        acceptance_criteria: serde_json::from_value(row.acceptance_criteria)
            .map_err(TaskRepositoryError::persistence)?,
        category,
        owner,
        status,
        depends_on,
        priority: row.priority,
        output: row.output,
        logs: serde_json::from_value(row.logs).map_err(TaskRepositoryError::persistence)?,
        waiting_reason: row.waiting_reason,
        claimed_by,
        created_by: row.created_by,
        revision: u64::try_from(row.revision).map_err(TaskRepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn to_handoff_row(handoff: &Handoff) -> TaskRepositoryResult<HandoffRow> {
    Ok(HandoffRow {
        id: handoff.id().into_inner(),
        from_task_id: handoff.from_task_id().into_inner(),
        to_task_id: handoff.to_task_id().map(TaskId::into_inner),
        summary: handoff.summary().to_owned(),
        artifacts: serde_json::to_value(handoff.artifacts())
            .map_err(TaskRepositoryError::persistence)?,
        created_at: handoff.created_at(),
    })
}

fn row_to_handoff(row: HandoffRow) -> TaskRepositoryResult<Handoff> {
    let artifacts = serde_json::from_value::<Vec<HandoffArtifact>>(row.artifacts)
        .map_err(TaskRepositoryError::persistence)?;
    Ok(Handoff::from_persisted(PersistedHandoffData {
        id: HandoffId::from_uuid(row.id),
        from_task_id: TaskId::from_uuid(row.from_task_id),
        to_task_id: row.to_task_id.map(TaskId::from_uuid),
        summary: row.summary,
        artifacts,
        created_at: row.created_at,
    }))
}
