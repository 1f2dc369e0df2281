//! Plan record: the raw goal text a task chain was decomposed from.

use super::{PlanDomainError, PlanId};
use crate::project::domain::ProjectId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Stored plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    id: PlanId,
    project_id: ProjectId,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPlanData {
    /// Plan identifier.
    pub id: PlanId,
    /// Owning project.
    pub project_id: ProjectId,
    /// First non-empty line of the text.
    pub title: String,
    /// Raw plan text.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Creates a plan titled by the first non-empty line of `text`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanDomainError::EmptyPlanText`] when `text` is blank.
    pub fn new(
        project_id: ProjectId,
        text: &str,
        clock: &impl Clock,
    ) -> Result<Self, PlanDomainError> {
        let title = text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or(PlanDomainError::EmptyPlanText)?;
        Ok(Self {
            id: PlanId::new(),
            project_id,
            title: title.to_owned(),
            description: text.to_owned(),
            created_at: clock.utc(),
        })
    }

    /// Reconstructs a plan from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPlanData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            created_at: data.created_at,
        }
    }

    /// Returns the plan identifier.
    #[must_use]
    pub const fn id(&self) -> PlanId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the plan title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the raw plan text.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
