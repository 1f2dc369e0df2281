//! `PostgreSQL` adapters for plan persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresPlanRepository;
