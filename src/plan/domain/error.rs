//! Error types for plan parsing and records.

use thiserror::Error;

/// Errors raised by plan validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanDomainError {
    /// The plan text contains no non-blank line.
    #[error("plan text must not be empty")]
    EmptyPlanText,
}
