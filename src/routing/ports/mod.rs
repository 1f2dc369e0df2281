//! Port contracts for routing template storage.

pub mod repository;

pub use repository::{TemplateRepository, TemplateRepositoryError, TemplateRepositoryResult};
