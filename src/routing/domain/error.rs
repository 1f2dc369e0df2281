//! Error types for routing rule and template validation.

use crate::task::domain::TaskCategory;
use thiserror::Error;

/// Errors raised while building routing rules and templates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingDomainError {
    /// Template names must not be blank.
    #[error("template name must not be empty")]
    EmptyTemplateName,

    /// Template versions must not be blank.
    #[error("template version must not be empty")]
    EmptyTemplateVersion,

    /// A keyword pattern was blank.
    #[error("keyword patterns for category {0} must not be empty")]
    EmptyKeyword(TaskCategory),

    /// Two owner rules named the same category.
    #[error("duplicate routing rule for category {0}")]
    DuplicateRule(TaskCategory),

    /// Two keyword matchers named the same category.
    #[error("duplicate keyword matcher for category {0}")]
    DuplicateKeywordCategory(TaskCategory),

    /// A template definition document could not be decoded.
    #[error("invalid template definition: {0}")]
    InvalidDefinition(String),
}
