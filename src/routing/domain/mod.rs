//! Domain model for routing tasks to agents or humans.

mod error;
mod ids;
mod rules;
mod template;

pub use error::RoutingDomainError;
pub use ids::TemplateId;
pub use rules::{KeywordMatcher, RoutingRule, RoutingRules};
pub use template::{
    DEFAULT_TEMPLATE_VERSION, PersistedTemplateData, RoutingTemplate, TemplateDefinition,
};
