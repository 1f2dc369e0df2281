//! Owner rules and keyword matchers.

use super::RoutingDomainError;
use crate::task::domain::{TaskCategory, TaskOwner};
use serde::{Deserialize, Serialize};

/// Maps a category to the role that must own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Category the rule applies to.
    pub category: TaskCategory,
    /// Whether tasks of this category go to a human.
    pub requires_human: bool,
}

impl RoutingRule {
    /// Creates a rule.
    #[must_use]
    pub const fn new(category: TaskCategory, requires_human: bool) -> Self {
        Self {
            category,
            requires_human,
        }
    }
}

/// Trigger substrings that infer a category from task text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatcher {
    /// Category inferred on a match.
    pub category: TaskCategory,
    /// Lower-cased trigger substrings.
    pub patterns: Vec<String>,
}

impl KeywordMatcher {
    /// Creates a matcher, lower-casing and trimming every pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError::EmptyKeyword`] when a pattern is blank.
    pub fn new(
        category: TaskCategory,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, RoutingDomainError> {
        let normalized = patterns
            .into_iter()
            .map(|pattern| {
                let raw: String = pattern.into();
                let lowered = raw.trim().to_lowercase();
                if lowered.is_empty() {
                    Err(RoutingDomainError::EmptyKeyword(category))
                } else {
                    Ok(lowered)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            category,
            patterns: normalized,
        })
    }

    /// Returns `true` when any pattern occurs in the lower-cased `text`.
    #[must_use]
    pub fn matches(&self, lowered_text: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| lowered_text.contains(pattern.as_str()))
    }
}

/// Ordered owner rules plus an ordered keyword table.
///
/// Keyword evaluation is first-declared-category-wins, so matchers must be
/// ordered from most to least specific.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoutingRules {
    rules: Vec<RoutingRule>,
    keywords: Vec<KeywordMatcher>,
}

impl RoutingRules {
    /// Creates a rule set.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingDomainError::DuplicateRule`] when two rules name the
    /// same category, and [`RoutingDomainError::DuplicateKeywordCategory`]
    /// when two matchers do.
    pub fn new(
        rules: Vec<RoutingRule>,
        keywords: Vec<KeywordMatcher>,
    ) -> Result<Self, RoutingDomainError> {
        for (index, rule) in rules.iter().enumerate() {
            if rules
                .iter()
                .skip(index + 1)
                .any(|other| other.category == rule.category)
            {
                return Err(RoutingDomainError::DuplicateRule(rule.category));
            }
        }
        for (index, matcher) in keywords.iter().enumerate() {
            if keywords
                .iter()
                .skip(index + 1)
                .any(|other| other.category == matcher.category)
            {
                return Err(RoutingDomainError::DuplicateKeywordCategory(
                    matcher.category,
                ));
            }
        }
        Ok(Self { rules, keywords })
    }

    /// Returns the built-in rule set used when no template is stored.
    ///
    /// Credentials, review and deploy work goes to a human; everything else
    /// to an agent.
    #[must_use]
    pub fn builtin() -> Self {
        let rules = vec![
            RoutingRule::new(TaskCategory::Credentials, true),
            RoutingRule::new(TaskCategory::Implementation, false),
            RoutingRule::new(TaskCategory::Testing, false),
            RoutingRule::new(TaskCategory::Review, true),
            RoutingRule::new(TaskCategory::Deploy, true),
            RoutingRule::new(TaskCategory::Docs, false),
            RoutingRule::new(TaskCategory::Custom, false),
        ];
        let keywords = [
            (
                TaskCategory::Credentials,
                &["api key", "credential", "secret", "password", "token"][..],
            ),
            (TaskCategory::Deploy, &["deploy", "release", "publish"][..]),
            (TaskCategory::Review, &["review", "approve", "sign off"][..]),
            (TaskCategory::Testing, &["test", "verify"][..]),
            (TaskCategory::Docs, &["docs", "documentation", "readme"][..]),
        ]
        .into_iter()
        .map(|(category, patterns)| KeywordMatcher {
            category,
            patterns: patterns.iter().map(|pattern| (*pattern).to_owned()).collect(),
        })
        .collect();
        Self { rules, keywords }
    }

    /// Returns the owner rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Returns the keyword matchers in evaluation order.
    #[must_use]
    pub fn keywords(&self) -> &[KeywordMatcher] {
        &self.keywords
    }

    /// Infers a category from task text.
    ///
    /// Lower-cases `title` and `description` joined by a space and returns
    /// the first matcher's category with a substring hit, falling back to
    /// [`TaskCategory::Implementation`].
    #[must_use]
    pub fn match_category(&self, title: &str, description: &str) -> TaskCategory {
        let text = format!("{title} {description}").to_lowercase();
        self.keywords
            .iter()
            .find(|matcher| matcher.matches(&text))
            .map_or(TaskCategory::Implementation, |matcher| matcher.category)
    }

    /// Returns the owner required for `category`, defaulting to agent.
    #[must_use]
    pub fn owner_for(&self, category: TaskCategory) -> TaskOwner {
        let requires_human = self
            .rules
            .iter()
            .find(|rule| rule.category == category)
            .is_some_and(|rule| rule.requires_human);
        if requires_human {
            TaskOwner::Human
        } else {
            TaskOwner::Agent
        }
    }

    /// Matches a category and resolves its owner in one step.
    #[must_use]
    pub fn route(&self, title: &str, description: &str) -> (TaskCategory, TaskOwner) {
        let category = self.match_category(title, description);
        (category, self.owner_for(category))
    }
}
