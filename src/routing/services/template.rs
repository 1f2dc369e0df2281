//! Service layer for routing template administration.

use crate::routing::{
    domain::{RoutingDomainError, RoutingRules, RoutingTemplate, TemplateDefinition, TemplateId},
    ports::{TemplateRepository, TemplateRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for creating a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTemplateRequest {
    name: String,
    version: Option<String>,
    rules: RoutingRules,
    is_default: bool,
}

impl CreateTemplateRequest {
    /// Creates a request with a name and rule set.
    #[must_use]
    pub fn new(name: impl Into<String>, rules: RoutingRules) -> Self {
        Self {
            name: name.into(),
            version: None,
            rules,
            is_default: false,
        }
    }

    /// Sets the version label.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Marks the new template as the default.
    #[must_use]
    pub const fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Service-level errors for template operations.
#[derive(Debug, Error)]
pub enum TemplateServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] RoutingDomainError),
    /// The template does not exist.
    #[error("template not found: {0}")]
    NotFound(TemplateId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TemplateRepositoryError),
}

/// Result type for template service operations.
pub type TemplateServiceResult<T> = Result<T, TemplateServiceError>;

/// Routing template administration service.
#[derive(Clone)]
pub struct TemplateService<R, C>
where
    R: TemplateRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> TemplateService<R, C>
where
    R: TemplateRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new template service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Creates and stores a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError`] when validation or persistence fails.
    pub async fn create(
        &self,
        request: CreateTemplateRequest,
    ) -> TemplateServiceResult<RoutingTemplate> {
        let mut template =
            RoutingTemplate::new(request.name, request.version, request.rules, &*self.clock)?;
        if request.is_default {
            template.set_default(true, &*self.clock);
        }
        self.repository.store(&template).await?;
        info!(
            template_id = %template.id(),
            name = template.name(),
            is_default = template.is_default(),
            "routing template created"
        );
        Ok(template)
    }

    /// Creates a template from a JSON definition document.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::Domain`] when the document is
    /// malformed or its rules are invalid.
    pub async fn import_json(&self, document: &str) -> TemplateServiceResult<RoutingTemplate> {
        let definition = TemplateDefinition::from_json(document)?;
        let rules = definition.to_rules()?;
        let mut request = CreateTemplateRequest::new(definition.name, rules);
        if let Some(version) = definition.version {
            request = request.with_version(version);
        }
        if definition.is_default {
            request = request.as_default();
        }
        self.create(request).await
    }

    /// Retrieves a template by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::NotFound`] when it does not exist.
    pub async fn get(&self, id: TemplateId) -> TemplateServiceResult<RoutingTemplate> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TemplateServiceError::NotFound(id))
    }

    /// Lists templates, default first.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::Repository`] when the lookup fails.
    pub async fn list(&self) -> TemplateServiceResult<Vec<RoutingTemplate>> {
        Ok(self.repository.list().await?)
    }

    /// Returns the stored default template, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::Repository`] when the lookup fails.
    pub async fn default_template(&self) -> TemplateServiceResult<Option<RoutingTemplate>> {
        Ok(self.repository.find_default().await?)
    }

    /// Returns the default template's rules, or the built-in rules when no
    /// default is stored.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::Repository`] when the lookup fails.
    pub async fn effective_rules(&self) -> TemplateServiceResult<RoutingRules> {
        Ok(self
            .repository
            .find_default()
            .await?
            .map_or_else(RoutingRules::builtin, |template| template.rules().clone()))
    }

    /// Makes `id` the only default template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::NotFound`] when it does not exist.
    pub async fn set_default(&self, id: TemplateId) -> TemplateServiceResult<RoutingTemplate> {
        let mut template = self.get(id).await?;
        template.set_default(true, &*self.clock);
        self.repository.update(&template).await?;
        info!(template_id = %id, "default routing template changed");
        Ok(template)
    }

    /// Replaces a template's rules under a new version label.
    ///
    /// Projects keep the snapshot they were initialised with.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError`] when the template is missing, the
    /// version is blank or persistence fails.
    pub async fn revise(
        &self,
        id: TemplateId,
        version: &str,
        rules: RoutingRules,
    ) -> TemplateServiceResult<RoutingTemplate> {
        let mut template = self.get(id).await?;
        template.revise(version, rules, &*self.clock)?;
        self.repository.update(&template).await?;
        Ok(template)
    }

    /// Deletes a template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateServiceError::NotFound`] when it does not exist.
    pub async fn delete(&self, id: TemplateId) -> TemplateServiceResult<()> {
        if self.repository.delete(id).await? {
            info!(template_id = %id, "routing template deleted");
            Ok(())
        } else {
            Err(TemplateServiceError::NotFound(id))
        }
    }
}
