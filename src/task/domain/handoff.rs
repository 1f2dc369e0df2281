//! Handoff records carrying completion context to downstream tasks.
//!
//! A handoff is written exactly once, when its source task completes: one per
//! dependent, or a single audit record with no recipient when nothing depends
//! on the task. Handoffs are never mutated afterwards.

use super::{HandoffId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum length, in characters, of the summary that must accompany a
/// completion.
pub const MIN_HANDOFF_SUMMARY_CHARS: usize = 200;

/// Structured artifact attached to a handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffArtifact {
    kind: String,
    payload: Value,
}

impl HandoffArtifact {
    /// Creates an artifact with a type tag and arbitrary payload.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyArtifactKind`] if the type tag is
    /// blank.
    pub fn new(kind: impl Into<String>, payload: Value) -> Result<Self, TaskDomainError> {
        let raw = kind.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyArtifactKind);
        }
        Ok(Self {
            kind: normalized.to_owned(),
            payload,
        })
    }

    /// Returns the artifact type tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the artifact payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }
}

/// Immutable context record from a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    id: HandoffId,
    from_task_id: TaskId,
    to_task_id: Option<TaskId>,
    summary: String,
    artifacts: Vec<HandoffArtifact>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted handoff.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedHandoffData {
    /// Persisted handoff identifier.
    pub id: HandoffId,
    /// Completed task the context came from.
    pub from_task_id: TaskId,
    /// Recipient task, or `None` for audit-only records.
    pub to_task_id: Option<TaskId>,
    /// Summary text.
    pub summary: String,
    /// Structured artifacts.
    pub artifacts: Vec<HandoffArtifact>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Handoff {
    /// Creates a handoff.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyHandoffSummary`] if the summary is
    /// blank.
    pub fn new(
        from_task_id: TaskId,
        to_task_id: Option<TaskId>,
        summary: impl Into<String>,
        artifacts: Vec<HandoffArtifact>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let summary_text = summary.into();
        if summary_text.trim().is_empty() {
            return Err(TaskDomainError::EmptyHandoffSummary);
        }
        Ok(Self {
            id: HandoffId::new(),
            from_task_id,
            to_task_id,
            summary: summary_text,
            artifacts,
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a handoff from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedHandoffData) -> Self {
        Self {
            id: data.id,
            from_task_id: data.from_task_id,
            to_task_id: data.to_task_id,
            summary: data.summary,
            artifacts: data.artifacts,
            created_at: data.created_at,
        }
    }

    /// Returns the handoff identifier.
    #[must_use]
    pub const fn id(&self) -> HandoffId {
        self.id
    }

    /// Returns the completed source task.
    #[must_use]
    pub const fn from_task_id(&self) -> TaskId {
        self.from_task_id
    }

    /// Returns the recipient task, if any.
    #[must_use]
    pub const fn to_task_id(&self) -> Option<TaskId> {
        self.to_task_id
    }

    /// Returns `true` for audit-only records with no recipient.
    #[must_use]
    pub const fn is_audit_only(&self) -> bool {
        self.to_task_id.is_none()
    }

    /// Returns the summary text.
    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the structured artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &[HandoffArtifact] {
        &self.artifacts
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the handoff was sent from or to `task_id`.
    #[must_use]
    pub fn involves(&self, task_id: TaskId) -> bool {
        self.from_task_id == task_id || self.to_task_id == Some(task_id)
    }
}

/// Builds the fan-out for a completion: one handoff per dependent, or one
/// audit-only handoff when `downstream` is empty.
///
/// # Errors
///
/// Returns [`TaskDomainError::EmptyHandoffSummary`] if the summary is blank.
pub fn plan_handoffs(
    from_task_id: TaskId,
    downstream: &[TaskId],
    summary: &str,
    artifacts: &[HandoffArtifact],
    clock: &impl Clock,
) -> Result<Vec<Handoff>, TaskDomainError> {
    if downstream.is_empty() {
        return Ok(vec![Handoff::new(
            from_task_id,
            None,
            summary,
            artifacts.to_vec(),
            clock,
        )?]);
    }
    downstream
        .iter()
        .map(|to| Handoff::new(from_task_id, Some(*to), summary, artifacts.to_vec(), clock))
        .collect()
}
