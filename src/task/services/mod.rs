//! Application services for task lifecycle orchestration.

mod handoff;
mod lifecycle;

pub use handoff::{HandoffQueryError, HandoffService};
pub use lifecycle::{
    CompleteTaskRequest, CompletionOutcome, CreateTaskRequest, SelfUnblockRequest,
    TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
};
