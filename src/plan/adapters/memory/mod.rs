//! In-memory plan adapters.

mod plan;

pub use plan::InMemoryPlanRepository;
