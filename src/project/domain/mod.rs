//! Domain model for projects.

mod error;
mod ids;
mod project;

pub use error::ProjectDomainError;
pub use ids::{MAX_PROJECT_ID_LEN, ProjectId};
pub use project::{PersistedProjectData, Project, ProjectStatus, RoutingConfig};
