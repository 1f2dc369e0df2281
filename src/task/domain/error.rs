//! Error types for task domain validation, lifecycle rules and parsing.

use super::{TaskId, TaskOwner, TaskStatus};
use std::fmt;
use thiserror::Error;

/// Lifecycle operations, named in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskOperation {
    /// Claiming an executable task.
    Claim,
    /// Recording that claimed work began.
    Start,
    /// Completing claimed work.
    Complete,
    /// Rolling a claimed agent task back behind new human work.
    SelfUnblock,
    /// Abandoning a task.
    Cancel,
    /// Extending the dependency set.
    AddDependency,
}

impl TaskOperation {
    /// Returns the operation name used in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::SelfUnblock => "self-unblock",
            Self::Cancel => "cancel",
            Self::AddDependency => "add a dependency to",
        }
    }
}

impl fmt::Display for TaskOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error classification shared by every orchestration error.
///
/// Callers translate each kind into a message and a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An identifier did not resolve.
    NotFound,
    /// The operation is not legal from the current status.
    InvalidTransition,
    /// The acting role does not own or hold the claim on the task.
    OwnerMismatch,
    /// A dependency is not yet done.
    DependenciesUnsatisfied,
    /// Malformed input or a violated graph/handoff rule.
    Validation,
    /// A referenced dependency does not exist.
    NotFoundDependency,
    /// A concurrent writer changed a record this operation relied on.
    Conflict,
    /// The backing store failed.
    Store,
}

impl ErrorKind {
    /// Returns the process exit status a CLI should use for this kind.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Store => 1,
            Self::Validation => 2,
            Self::NotFound => 3,
            Self::InvalidTransition => 4,
            Self::OwnerMismatch => 5,
            Self::DependenciesUnsatisfied => 6,
            Self::NotFoundDependency => 7,
            Self::Conflict => 8,
        }
    }
}

/// Errors raised by task validation and lifecycle rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// No usable acceptance criterion was supplied.
    #[error("task must declare at least one non-empty acceptance criterion")]
    EmptyAcceptanceCriteria,

    /// A task may not depend on itself.
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),

    /// The dependency id does not resolve to a task in the same project.
    #[error("dependency task {0} does not exist")]
    UnknownDependency(TaskId),

    /// Adding the edge would close a cycle.
    #[error(
        "adding dependency {dependency_id} to task {task_id} would create a cycle: \
         {task_id} is already reachable from {dependency_id}"
    )]
    DependencyCycle {
        /// Task receiving the dependency.
        task_id: TaskId,
        /// Proposed dependency.
        dependency_id: TaskId,
    },

    /// Completion context is shorter than the mandatory minimum.
    #[error(
        "handoff summary for task {task_id} must be at least {minimum} characters (got {length})"
    )]
    HandoffTooShort {
        /// Task being completed.
        task_id: TaskId,
        /// Length of the rejected summary in characters.
        length: usize,
        /// Required minimum in characters.
        minimum: usize,
    },

    /// Handoff records require a non-empty summary.
    #[error("handoff summary must not be empty")]
    EmptyHandoffSummary,

    /// Handoff artifacts require a non-empty type tag.
    #[error("handoff artifact type must not be empty")]
    EmptyArtifactKind,

    /// The operation is not legal from the current status.
    #[error("cannot {operation} task {task_id} while it is {status}")]
    InvalidTransition {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Rejected operation.
        operation: TaskOperation,
        /// Status observed when the operation was rejected.
        status: TaskStatus,
    },

    /// The acting role does not own the task.
    #[error("task {task_id} is owned by {owner}, not {role}")]
    OwnerMismatch {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Owner recorded on the task.
        owner: TaskOwner,
        /// Role that attempted the operation.
        role: TaskOwner,
    },

    /// The acting role does not hold the claim.
    #[error("task {task_id} is not claimed by {role}")]
    ClaimMismatch {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Role that attempted the operation.
        role: TaskOwner,
    },

    /// At least one dependency is not done.
    #[error("task {0} has dependencies that are not done")]
    DependenciesUnsatisfied(TaskId),

    /// Self-unblock only applies to agent-owned work.
    #[error("self-unblock is only for agent-owned tasks; task {task_id} cannot be self-unblocked as {role}")]
    SelfUnblockNotAgent {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Role that attempted the operation.
        role: TaskOwner,
    },

    /// Self-unblock was called without dependencies.
    #[error("self-unblock of task {0} requires at least one human-owned dependency")]
    SelfUnblockWithoutDependencies(TaskId),

    /// Self-unblock may only point at human-owned work.
    #[error(
        "self-unblock of task {task_id} may only depend on human-owned tasks; \
         {dependency_id} is owned by {owner}"
    )]
    SelfUnblockNonHumanDependency {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Offending dependency.
        dependency_id: TaskId,
        /// Owner of the offending dependency.
        owner: TaskOwner,
    },

    /// Self-unblock must add something.
    #[error("self-unblock of task {0} must add at least one new human-owned dependency")]
    SelfUnblockNoNewDependency(TaskId),
}

impl TaskDomainError {
    /// Classifies the error for caller-facing handling.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::OwnerMismatch { .. }
            | Self::ClaimMismatch { .. }
            | Self::SelfUnblockNotAgent { .. } => ErrorKind::OwnerMismatch,
            Self::DependenciesUnsatisfied(_) => ErrorKind::DependenciesUnsatisfied,
            Self::UnknownDependency(_) => ErrorKind::NotFoundDependency,
            Self::EmptyTitle
            | Self::EmptyDescription
            | Self::EmptyAcceptanceCriteria
            | Self::SelfDependency(_)
            | Self::DependencyCycle { .. }
            | Self::HandoffTooShort { .. }
            | Self::EmptyHandoffSummary
            | Self::EmptyArtifactKind
            | Self::SelfUnblockWithoutDependencies(_)
            | Self::SelfUnblockNonHumanDependency { .. }
            | Self::SelfUnblockNoNewDependency(_) => ErrorKind::Validation,
        }
    }
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task owners.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task owner: {0}, expected agent or human")]
pub struct ParseTaskOwnerError(pub String);

/// Error returned while parsing task categories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task category: {0}")]
pub struct ParseTaskCategoryError(pub String);
