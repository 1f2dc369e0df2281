//! Application services for routing templates.

mod template;

pub use template::{
    CreateTemplateRequest, TemplateService, TemplateServiceError, TemplateServiceResult,
};
