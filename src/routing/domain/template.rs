//! Named, versioned routing templates and their JSON definition format.

use super::{KeywordMatcher, RoutingDomainError, RoutingRule, RoutingRules, TemplateId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Version assigned when a definition does not name one.
pub const DEFAULT_TEMPLATE_VERSION: &str = "1.0";

/// Operator-maintained routing rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTemplate {
    id: TemplateId,
    name: String,
    version: String,
    rules: RoutingRules,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTemplateData {
    /// Template identifier.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Version label.
    pub version: String,
    /// Owner rules and keyword matchers.
    pub rules: RoutingRules,
    /// Default flag.
    pub is_default: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RoutingTemplate {
    /// Creates a non-default template.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError::EmptyTemplateName`] or
    /// [`RoutingDomainError::EmptyTemplateVersion`] for blank labels.
    pub fn new(
        name: impl Into<String>,
        version: Option<String>,
        rules: RoutingRules,
        clock: &impl Clock,
    ) -> Result<Self, RoutingDomainError> {
        let raw_name = name.into();
        let trimmed_name = raw_name.trim();
        if trimmed_name.is_empty() {
            return Err(RoutingDomainError::EmptyTemplateName);
        }
        let resolved_version = version.map_or_else(
            || DEFAULT_TEMPLATE_VERSION.to_owned(),
            |label| label.trim().to_owned(),
        );
        if resolved_version.is_empty() {
            return Err(RoutingDomainError::EmptyTemplateVersion);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TemplateId::new(),
            name: trimmed_name.to_owned(),
            version: resolved_version,
            rules,
            is_default: false,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a template from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTemplateData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            version: data.version,
            rules: data.rules,
            is_default: data.is_default,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the template identifier.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version label.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the rule set.
    #[must_use]
    pub const fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// Returns `true` when this template is the default.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sets or clears the default flag.
    pub fn set_default(&mut self, is_default: bool, clock: &impl Clock) {
        if self.is_default != is_default {
            self.is_default = is_default;
            self.updated_at = clock.utc();
        }
    }

    /// Returns a copy with the default flag cleared. Used by repository
    /// adapters when another template takes the default.
    #[must_use]
    pub const fn without_default(mut self) -> Self {
        self.is_default = false;
        self
    }

    /// Replaces the rule set and bumps the version label.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError::EmptyTemplateVersion`] for a blank
    /// version.
    pub fn revise(
        &mut self,
        version: &str,
        rules: RoutingRules,
        clock: &impl Clock,
    ) -> Result<(), RoutingDomainError> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(RoutingDomainError::EmptyTemplateVersion);
        }
        trimmed.clone_into(&mut self.version);
        self.rules = rules;
        self.updated_at = clock.utc();
        Ok(())
    }
}

/// JSON document accepted by template import.
///
/// ```json
/// {
///   "name": "strict",
///   "version": "2.0",
///   "rules": [{ "category": "deploy", "requires_human": true }],
///   "keywords": [{ "category": "deploy", "patterns": ["ship"] }],
///   "is_default": true
/// }
/// ```
///
/// Keywords are an array so that evaluation order survives decoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TemplateDefinition {
    /// Display name.
    pub name: String,
    /// Version label, defaulting to [`DEFAULT_TEMPLATE_VERSION`].
    #[serde(default)]
    pub version: Option<String>,
    /// Owner rules.
    #[serde(default)]
    pub rules: Vec<RoutingRule>,
    /// Keyword matchers in evaluation order.
    #[serde(default)]
    pub keywords: Vec<KeywordMatcher>,
    /// Whether the imported template becomes the default.
    #[serde(default)]
    pub is_default: bool,
}

impl TemplateDefinition {
    /// Decodes a definition document.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError::InvalidDefinition`] when the JSON does
    /// not match the definition shape.
    pub fn from_json(document: &str) -> Result<Self, RoutingDomainError> {
        serde_json::from_str(document)
            .map_err(|err| RoutingDomainError::InvalidDefinition(err.to_string()))
    }

    /// Validates the definition into a rule set, normalising keyword patterns.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError`] for blank patterns or duplicate
    /// categories.
    pub fn to_rules(&self) -> Result<RoutingRules, RoutingDomainError> {
        let keywords = self
            .keywords
            .iter()
            .map(|matcher| KeywordMatcher::new(matcher.category, matcher.patterns.iter().cloned()))
            .collect::<Result<Vec<_>, _>>()?;
        RoutingRules::new(self.rules.clone(), keywords)
    }
}
