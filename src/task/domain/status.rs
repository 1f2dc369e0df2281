//! Task status, ownership and category enumerations.

use super::{ParseTaskCategoryError, ParseTaskOwnerError, ParseTaskStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// `Ready` and `AwaitingHuman` are the same "executable" notion expressed per
/// owner: agent-owned tasks become `Ready`, human-owned tasks become
/// `AwaitingHuman`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// At least one dependency is not yet done.
    Blocked,
    /// Executable and waiting for an agent to claim it.
    Ready,
    /// Executable and waiting for a human to claim it.
    AwaitingHuman,
    /// Claimed and being worked on.
    InProgress,
    /// Completed successfully.
    Done,
    /// Abandoned. Dependents stay blocked until re-pointed.
    Cancelled,
}

impl TaskStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Blocked,
        Self::Ready,
        Self::AwaitingHuman,
        Self::InProgress,
        Self::Done,
        Self::Cancelled,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocked => "blocked",
            Self::Ready => "ready",
            Self::AwaitingHuman => "awaiting_human",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns the executable status for tasks owned by `owner`.
    #[must_use]
    pub const fn executable_for(owner: TaskOwner) -> Self {
        match owner {
            TaskOwner::Agent => Self::Ready,
            TaskOwner::Human => Self::AwaitingHuman,
        }
    }

    /// Returns `true` when a task in this status may be claimed.
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Ready | Self::AwaitingHuman)
    }

    /// Returns `true` when no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role that owns, and may claim, a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOwner {
    /// An autonomous agent.
    Agent,
    /// A human operator.
    Human,
}

impl TaskOwner {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Human => "human",
        }
    }
}

impl TryFrom<&str> for TaskOwner {
    type Error = ParseTaskOwnerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "agent" => Ok(Self::Agent),
            "human" => Ok(Self::Human),
            _ => Err(ParseTaskOwnerError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of task categories used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Writing or changing code.
    Implementation,
    /// Writing or running tests.
    Testing,
    /// Reviewing someone else's work.
    Review,
    /// Providing secrets, keys or accounts.
    Credentials,
    /// Shipping to an environment.
    Deploy,
    /// Writing documentation.
    Docs,
    /// Anything else.
    Custom,
}

impl TaskCategory {
    /// Every category in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Implementation,
        Self::Testing,
        Self::Review,
        Self::Credentials,
        Self::Deploy,
        Self::Docs,
        Self::Custom,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Testing => "testing",
            Self::Review => "review",
            Self::Credentials => "credentials",
            Self::Deploy => "deploy",
            Self::Docs => "docs",
            Self::Custom => "custom",
        }
    }
}

impl TryFrom<&str> for TaskCategory {
    type Error = ParseTaskCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| ParseTaskCategoryError(value.to_owned()))
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
