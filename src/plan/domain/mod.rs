//! Domain model for plans and plan text parsing.

mod error;
mod ids;
mod parser;
mod plan;

pub use error::PlanDomainError;
pub use ids::PlanId;
pub use parser::{ParsedTask, parse_plan_text};
pub use plan::{PersistedPlanData, Plan};
