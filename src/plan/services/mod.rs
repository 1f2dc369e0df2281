//! Application services for plan decomposition.

mod decomposer;

pub use decomposer::{
    DECOMPOSER_ROLE, PlanDecomposer, PlanDecomposition, PlanServiceError, PlanServiceResult,
};
