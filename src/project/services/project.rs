//! Service layer for project initialisation and administration.

use crate::project::{
    domain::{Project, ProjectDomainError, ProjectId, RoutingConfig},
    ports::{ProjectRepository, ProjectRepositoryError},
};
use crate::routing::{
    domain::TemplateId,
    ports::{TemplateRepository, TemplateRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for initialising a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializeProjectRequest {
    id: ProjectId,
    name: String,
    template_id: Option<TemplateId>,
    workflow_instructions: Option<String>,
}

impl InitializeProjectRequest {
    /// Creates a request using the default template.
    #[must_use]
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            template_id: None,
            workflow_instructions: None,
        }
    }

    /// Snapshots a specific template instead of the default.
    #[must_use]
    pub const fn with_template(mut self, template_id: TemplateId) -> Self {
        self.template_id = Some(template_id);
        self
    }

    /// Sets the initial workflow instructions.
    #[must_use]
    pub fn with_workflow_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.workflow_instructions = Some(instructions.into());
        self
    }
}

/// Service-level errors for project operations.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    /// The requested template does not exist.
    #[error("template not found: {0}")]
    TemplateNotFound(TemplateId),
    /// Project repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// Template repository operation failed.
    #[error(transparent)]
    Template(#[from] TemplateRepositoryError),
}

/// Result type for project service operations.
pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project administration service.
#[derive(Clone)]
pub struct ProjectService<P, T, C>
where
    P: ProjectRepository,
    T: TemplateRepository,
    C: Clock + Send + Sync,
{
    projects: Arc<P>,
    templates: Arc<T>,
    clock: Arc<C>,
}

impl<P, T, C> ProjectService<P, T, C>
where
    P: ProjectRepository,
    T: TemplateRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new project service.
    #[must_use]
    pub const fn new(projects: Arc<P>, templates: Arc<T>, clock: Arc<C>) -> Self {
        Self {
            projects,
            templates,
            clock,
        }
    }

    /// Creates a project, freezing the routing rules of the requested
    /// template, the stored default, or the built-in rules.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError`] when the name is blank, the template
    /// is missing or the slug is taken.
    pub async fn initialize(
        &self,
        request: InitializeProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let mut routing = match request.template_id {
            Some(template_id) => self
                .templates
                .find_by_id(template_id)
                .await?
                .map(|template| RoutingConfig::from_template(&template))
                .ok_or(ProjectServiceError::TemplateNotFound(template_id))?,
            None => self
                .templates
                .find_default()
                .await?
                .map_or_else(RoutingConfig::builtin, |template| {
                    RoutingConfig::from_template(&template)
                }),
        };
        routing.workflow_instructions = request.workflow_instructions;
        let project = Project::new(request.id, &request.name, routing, &*self.clock)?;
        self.projects.store(&project).await?;
        info!(
            project_id = %project.id(),
            template_version = project.routing().template_version.as_str(),
            "project initialised"
        );
        Ok(project)
    }

    /// Retrieves a project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] when it does not exist.
    pub async fn get(&self, id: &ProjectId) -> ProjectServiceResult<Project> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or_else(|| ProjectServiceError::NotFound(id.clone()))
    }

    /// Lists all projects.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.projects.list().await?)
    }

    /// Replaces the free-text workflow instructions. Routing rules are
    /// never changed.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotFound`] when it does not exist.
    pub async fn update_instructions(
        &self,
        id: &ProjectId,
        instructions: Option<String>,
    ) -> ProjectServiceResult<Project> {
        let mut project = self.get(id).await?;
        project.update_instructions(instructions, &*self.clock);
        self.projects.update(&project).await?;
        Ok(project)
    }

    /// Archives a project. Its tasks remain readable.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError`] when it does not exist or is already
    /// archived.
    pub async fn archive(&self, id: &ProjectId) -> ProjectServiceResult<Project> {
        let mut project = self.get(id).await?;
        project.archive(&*self.clock)?;
        self.projects.update(&project).await?;
        info!(project_id = %id, "project archived");
        Ok(project)
    }
}
