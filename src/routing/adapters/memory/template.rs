//! In-memory repository for routing templates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::routing::{
    domain::{RoutingTemplate, TemplateId},
    ports::{TemplateRepository, TemplateRepositoryError, TemplateRepositoryResult},
};

/// Thread-safe in-memory template repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateRepository {
    state: Arc<RwLock<HashMap<TemplateId, RoutingTemplate>>>,
}

impl InMemoryTemplateRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> TemplateRepositoryError {
    TemplateRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn clear_other_defaults(templates: &mut HashMap<TemplateId, RoutingTemplate>, keep: TemplateId) {
    let stale: Vec<TemplateId> = templates
        .values()
        .filter(|template| template.is_default() && template.id() != keep)
        .map(RoutingTemplate::id)
        .collect();
    for id in stale {
        if let Some(template) = templates.remove(&id) {
            templates.insert(id, template.without_default());
        }
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn store(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()> {
        let mut templates = self.state.write().map_err(lock_error)?;
        if templates.contains_key(&template.id()) {
            return Err(TemplateRepositoryError::DuplicateTemplate(template.id()));
        }
        if template.is_default() {
            clear_other_defaults(&mut templates, template.id());
        }
        templates.insert(template.id(), template.clone());
        Ok(())
    }

    async fn update(&self, template: &RoutingTemplate) -> TemplateRepositoryResult<()> {
        let mut templates = self.state.write().map_err(lock_error)?;
        if !templates.contains_key(&template.id()) {
            return Err(TemplateRepositoryError::NotFound(template.id()));
        }
        if template.is_default() {
            clear_other_defaults(&mut templates, template.id());
        }
        templates.insert(template.id(), template.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TemplateId) -> TemplateRepositoryResult<Option<RoutingTemplate>> {
        let templates = self.state.read().map_err(lock_error)?;
        Ok(templates.get(&id).cloned())
    }

    async fn find_default(&self) -> TemplateRepositoryResult<Option<RoutingTemplate>> {
        let templates = self.state.read().map_err(lock_error)?;
        Ok(templates
            .values()
            .find(|template| template.is_default())
            .cloned())
    }

    async fn list(&self) -> TemplateRepositoryResult<Vec<RoutingTemplate>> {
        let templates = self.state.read().map_err(lock_error)?;
        let mut listed: Vec<RoutingTemplate> = templates.values().cloned().collect();
        listed.sort_by(|left, right| {
            right
                .is_default()
                .cmp(&left.is_default())
                .then_with(|| left.name().cmp(right.name()))
        });
        Ok(listed)
    }

    async fn delete(&self, id: TemplateId) -> TemplateRepositoryResult<bool> {
        let mut templates = self.state.write().map_err(lock_error)?;
        Ok(templates.remove(&id).is_some())
    }
}
