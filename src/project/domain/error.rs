//! Error types for project validation and lifecycle rules.

use super::ProjectId;
use thiserror::Error;

/// Errors raised by project validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The identifier is not a valid slug.
    #[error(
        "invalid project id {0:?}: use 1-64 lowercase letters, digits, '-' or '_'"
    )]
    InvalidProjectId(String),

    /// The display name is blank.
    #[error("project name must not be empty")]
    EmptyName,

    /// The project was already archived.
    #[error("project {0} is already archived")]
    AlreadyArchived(ProjectId),

    /// Error returned while parsing project statuses from persistence.
    #[error("unknown project status: {0}")]
    UnknownStatus(String),
}
