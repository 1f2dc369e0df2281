//! In-memory repository for projects.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::project::{
    domain::{Project, ProjectId},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<BTreeMap<ProjectId, Project>>>,
}

impl InMemoryProjectRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> ProjectRepositoryError {
    ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut projects = self.state.write().map_err(lock_error)?;
        if projects.contains_key(project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(
                project.id().clone(),
            ));
        }
        projects.insert(project.id().clone(), project.clone());
        Ok(())
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut projects = self.state.write().map_err(lock_error)?;
        let slot = projects
            .get_mut(project.id())
            .ok_or_else(|| ProjectRepositoryError::NotFound(project.id().clone()))?;
        *slot = project.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: &ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let projects = self.state.read().map_err(lock_error)?;
        Ok(projects.get(id).cloned())
    }

    async fn list(&self) -> ProjectRepositoryResult<Vec<Project>> {
        let projects = self.state.read().map_err(lock_error)?;
        Ok(projects.values().cloned().collect())
    }
}
