//! Application services for projects.

mod project;

pub use project::{
    InitializeProjectRequest, ProjectService, ProjectServiceError, ProjectServiceResult,
};
