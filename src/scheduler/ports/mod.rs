//! Scheduler port contracts.

mod invoker;

#[cfg(test)]
pub use invoker::MockTaskInvoker;
pub use invoker::{InvocationError, InvocationOutcome, TaskInvoker};
