//! Scheduler services.

mod scheduler;

pub use scheduler::{SCHEDULER_CLAIM_LOG, Scheduler, SchedulerError, TickOutcome};
