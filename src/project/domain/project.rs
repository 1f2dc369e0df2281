//! Project aggregate: a template-bound workspace that owns tasks.

use super::{ProjectDomainError, ProjectId};
use crate::routing::domain::{RoutingRules, RoutingTemplate, TemplateId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Project lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Accepts new tasks and plans.
    Active,
    /// Read-only; kept for its task history.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ProjectDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(ProjectDomainError::UnknownStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing configuration frozen into a project when it is initialised.
///
/// The rules are a snapshot: later template revisions do not reach existing
/// projects. Only the free-text instructions may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Template the snapshot was taken from; `None` for the built-in rules.
    pub template_id: Option<TemplateId>,
    /// Template version at snapshot time.
    pub template_version: String,
    /// Owner rules and keyword matchers.
    pub rules: RoutingRules,
    /// Guidance shown to whoever executes the project's tasks.
    pub workflow_instructions: Option<String>,
}

impl RoutingConfig {
    /// Snapshots a stored template.
    #[must_use]
    pub fn from_template(template: &RoutingTemplate) -> Self {
        Self {
            template_id: Some(template.id()),
            template_version: template.version().to_owned(),
            rules: template.rules().clone(),
            workflow_instructions: None,
        }
    }

    /// Uses the built-in rules.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            template_id: None,
            template_version: "builtin".to_owned(),
            rules: RoutingRules::builtin(),
            workflow_instructions: None,
        }
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    routing: RoutingConfig,
    status: ProjectStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Project slug.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Routing snapshot.
    pub routing: RoutingConfig,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates an active project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyName`] for a blank name.
    pub fn new(
        id: ProjectId,
        name: &str,
        mut routing: RoutingConfig,
        clock: &impl Clock,
    ) -> Result<Self, ProjectDomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyName);
        }
        routing.workflow_instructions = normalize_instructions(routing.workflow_instructions);
        let timestamp = clock.utc();
        Ok(Self {
            id,
            name: trimmed.to_owned(),
            routing,
            status: ProjectStatus::Active,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            routing: data.routing,
            status: data.status,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the project slug.
    #[must_use]
    pub const fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the routing snapshot.
    #[must_use]
    pub const fn routing(&self) -> &RoutingConfig {
        &self.routing
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns `true` while the project accepts new work.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ProjectStatus::Active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the workflow instructions; blank text clears them.
    ///
    /// The routing rules are untouched.
    pub fn update_instructions(&mut self, instructions: Option<String>, clock: &impl Clock) {
        self.routing.workflow_instructions = normalize_instructions(instructions);
        self.updated_at = clock.utc();
    }

    /// Archives the project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::AlreadyArchived`] when already archived.
    pub fn archive(&mut self, clock: &impl Clock) -> Result<(), ProjectDomainError> {
        if self.status == ProjectStatus::Archived {
            return Err(ProjectDomainError::AlreadyArchived(self.id.clone()));
        }
        self.status = ProjectStatus::Archived;
        self.updated_at = clock.utc();
        Ok(())
    }
}

fn normalize_instructions(instructions: Option<String>) -> Option<String> {
    instructions
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
