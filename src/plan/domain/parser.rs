//! Plan text parser.
//!
//! ```text
//! Ship Paddle billing            <- plan title, not a task
//! Audit current provider code    <- implicit task #0 (optional)
//! 1. Add Paddle to provider enum <- numbered item opens a task
//!    - touch billing/provider.rs <- bullet or plain line: task body
//!    - Acceptance: enum compiles <- marker line: acceptance criterion
//! 2) Create API key
//! ```
//!
//! Markers are `Acceptance:` and `AC:` (ASCII case-insensitive) and
//! `验收:` / `验收：`.

use super::PlanDomainError;
use serde::{Deserialize, Serialize};

const ASCII_MARKERS: [&str; 2] = ["acceptance:", "ac:"];
const LOCALIZED_MARKERS: [&str; 2] = ["验收:", "验收："];

/// One unit of work extracted from plan text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    /// Zero-based position in the plan.
    pub order: usize,
    /// Task title.
    pub title: String,
    /// Body lines other than acceptance markers, newline-joined.
    pub description: String,
    /// Acceptance criteria; never empty.
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Default)]
struct Draft {
    title: String,
    body: Vec<String>,
}

impl Draft {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            body: Vec::new(),
        }
    }

    fn finish(self, order: usize) -> ParsedTask {
        let mut description_lines = Vec::new();
        let mut criteria = Vec::new();
        for line in &self.body {
            match acceptance_marker(line) {
                Some(criterion) => criteria.push(criterion.to_owned()),
                None => description_lines.push(line.as_str()),
            }
        }
        let description = description_lines.join("\n");
        if criteria.is_empty() {
            criteria.push(if self.body.is_empty() {
                self.title.clone()
            } else {
                self.body.join("\n")
            });
        }
        ParsedTask {
            order,
            title: self.title,
            description,
            acceptance_criteria: criteria,
        }
    }
}

/// Parses plan text into ordered task units.
///
/// The first non-empty line is the plan title. A plan with nothing after
/// its title yields one task named after the plan.
///
/// # Errors
///
/// Returns [`PlanDomainError::EmptyPlanText`] when `text` is blank.
pub fn parse_plan_text(text: &str) -> Result<Vec<ParsedTask>, PlanDomainError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let plan_title = lines.next().ok_or(PlanDomainError::EmptyPlanText)?;

    let mut tasks = Vec::new();
    let mut current: Option<Draft> = None;
    for line in lines {
        if let Some(title) = numbered_item(line) {
            if let Some(done) = current.replace(Draft::new(title)) {
                tasks.push(done.finish(tasks.len()));
            }
            continue;
        }
        let content = bullet_item(line).unwrap_or(line);
        match current.as_mut() {
            Some(draft) => draft.body.push(content.to_owned()),
            None => current = Some(Draft::new(content)),
        }
    }
    if let Some(done) = current {
        tasks.push(done.finish(tasks.len()));
    }
    if tasks.is_empty() {
        tasks.push(Draft::new(plan_title).finish(0));
    }
    Ok(tasks)
}

/// Returns the title of a `<digits>.` or `<digits>)` item.
fn numbered_item(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let after_digits = line.get(digits..)?;
    let after_delimiter = after_digits
        .strip_prefix('.')
        .or_else(|| after_digits.strip_prefix(')'))?;
    let title = after_delimiter.trim_start();
    (!title.is_empty()).then_some(title)
}

/// Returns the content of a `-` or `*` bullet.
fn bullet_item(line: &str) -> Option<&str> {
    let after_bullet = line.strip_prefix('-').or_else(|| line.strip_prefix('*'))?;
    let content = after_bullet.trim_start();
    (!content.is_empty()).then_some(content)
}

/// Returns the criterion carried by an acceptance marker line.
fn acceptance_marker(line: &str) -> Option<&str> {
    let ascii = ASCII_MARKERS.iter().find_map(|marker| {
        line.get(..marker.len())
            .filter(|head| head.eq_ignore_ascii_case(marker))
            .and_then(|_| line.get(marker.len()..))
    });
    let criterion = ascii
        .or_else(|| {
            LOCALIZED_MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
        })?
        .trim();
    (!criterion.is_empty()).then_some(criterion)
}
