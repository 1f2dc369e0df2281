//! Repository port for routing template persistence.

use crate::routing::domain::{RoutingTemplate, TemplateId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for template repository operations.
pub type TemplateRepositoryResult<T> = Result<T, TemplateRepositoryError>;

/// Routing template persistence contract.
///
/// Implementations keep the "at most one default" invariant: storing or
/// updating a template whose default flag is set clears the flag on every
/// other template in the same atomic write.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Stores a new template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateRepositoryError::DuplicateTemplate`] when the id
    /// already exists.
    async fn store(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()>;

    /// Persists changes to an existing template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateRepositoryError::NotFound`] when the template does
    /// not exist.
    async fn update(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()>;

    /// Finds a template by identifier.
    async fn find_by_id(&self, id: TemplateId) -> TemplateRepositoryResult<Option<RoutingTemplate>>;

    /// Returns the default template, if one is marked.
    async fn find_default(&self) -> TemplateRepositoryResult<Option<RoutingTemplate>>;

    /// Lists templates, default first, then by name.
    async fn list(&self) -> TemplateRepositoryResult<Vec<RoutingTemplate>>;

    /// Deletes a template, returning `false` when it did not exist.
    async fn delete(&self, id: TemplateId) -> TemplateRepositoryResult<bool>;
}

/// Errors returned by template repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TemplateRepositoryError {
    /// A template with the same identifier already exists.
    #[error("duplicate template identifier: {0}")]
    DuplicateTemplate(TemplateId),

    /// The template was not found.
    #[error("template not found: {0}")]
    NotFound(TemplateId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TemplateRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
