//! Domain model for task orchestration.
//!
//! The task domain holds the task aggregate and its lifecycle state machine,
//! the dependency graph used for readiness and cycle checks, and the handoff
//! records that carry completion context downstream. Nothing here touches
//! storage.

mod error;
mod graph;
mod handoff;
mod ids;
mod status;
mod task;

pub use error::{
    ErrorKind, ParseTaskCategoryError, ParseTaskOwnerError, ParseTaskStatusError,
    TaskDomainError, TaskOperation,
};
pub use graph::{DependencyGraph, Reachability};
pub use handoff::{
    Handoff, HandoffArtifact, MIN_HANDOFF_SUMMARY_CHARS, PersistedHandoffData, plan_handoffs,
};
pub use ids::{HandoffId, TaskId};
pub use status::{TaskCategory, TaskOwner, TaskStatus};
pub use task::{PersistedTaskData, Task, TaskDraft};
