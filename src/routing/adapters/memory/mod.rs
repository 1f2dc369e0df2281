//! In-memory routing adapters.

mod template;

pub use template::InMemoryTemplateRepository;
