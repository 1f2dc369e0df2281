//! `PostgreSQL` adapters for routing template persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresTemplateRepository;
