//! The canonical itinerary document and the validator that produces it.
//!
//! [`CanonicalDocument::raw`] is the only hand-off to presentation: the
//! on-screen renderer and the export renderer both consume it, and both can
//! rely on the same section layout:
//!
//! ```text
//! ## Day 1: <title>
//! <blank>
//! <body lines>
//! <blank>
//! ## Day 2: <title>
//! ...
//! ```

pub mod validator;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use validator::{OutputValidator, validate};

/// One validated day of the itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySection {
    /// 1-based day number.
    pub day: u32,
    /// Heading title; `Day N` when the model gave none.
    pub title: String,
    /// Normalized Markdown body, never empty.
    pub body: String,
}

impl DaySection {
    /// Whether the title is the generated `Day N` fallback.
    pub fn has_default_title(&self) -> bool {
        self.title == default_title(self.day)
    }

    /// The section's heading line in canonical form.
    pub fn heading(&self) -> String {
        if self.has_default_title() {
            format!("## Day {}", self.day)
        } else {
            format!("## Day {}: {}", self.day, self.title)
        }
    }
}

pub(crate) fn default_title(day: u32) -> String {
    format!("Day {day}")
}

/// A validated, normalized itinerary. `sections.len()` always equals the
/// requested day count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalDocument {
    pub sections: Vec<DaySection>,
    pub raw: String,
}

impl CanonicalDocument {
    pub(crate) fn from_sections(sections: Vec<DaySection>) -> Self {
        let raw = render(&sections);
        Self { sections, raw }
    }

    pub fn day_count(&self) -> usize {
        self.sections.len()
    }
}

impl fmt::Display for CanonicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn render(sections: &[DaySection]) -> String {
    let mut raw = sections
        .iter()
        .map(|s| format!("{}\n\n{}", s.heading(), s.body))
        .collect::<Vec<_>>()
        .join("\n\n");
    raw.push('\n');
    raw
}

/// Structural contract violations, reported by the first failing check.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationFailure {
    #[error("the response was empty")]
    EmptyDocument,

    #[error("the response is {actual} characters long (limit {limit})")]
    TooLong { limit: usize, actual: usize },

    #[error("Day {day} is missing")]
    MissingSection { day: u32 },

    #[error("Day {day} appears more than once")]
    DuplicateSection { day: u32 },

    #[error("expected {expected} day sections, found {found}")]
    WrongSectionCount { expected: u32, found: usize },

    /// A marker numbered below 1, such as a `Day 0` travel day.
    #[error("Day {day} is outside the requested Day 1 to Day {expected}")]
    DayOutOfRange { day: u32, expected: u32 },

    #[error("Day {day} has no content")]
    EmptyBody { day: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(day: u32, title: &str, body: &str) -> DaySection {
        DaySection {
            day,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn heading_omits_default_title() {
        assert_eq!(section(2, "Day 2", "- x").heading(), "## Day 2");
        assert_eq!(section(2, "Harbour", "- x").heading(), "## Day 2: Harbour");
    }

    #[test]
    fn render_uses_single_blank_line_separators() {
        let doc = CanonicalDocument::from_sections(vec![
            section(1, "Arrival", "- Check in"),
            section(2, "Day 2", "- Museum\n\n- Dinner"),
        ]);
        assert_eq!(
            doc.raw,
            "## Day 1: Arrival\n\n- Check in\n\n## Day 2\n\n- Museum\n\n- Dinner\n"
        );
        assert_eq!(doc.to_string(), doc.raw);
        assert_eq!(doc.day_count(), 2);
    }

    #[test]
    fn failure_messages() {
        assert_eq!(
            ValidationFailure::MissingSection { day: 2 }.to_string(),
            "Day 2 is missing"
        );
        assert_eq!(
            ValidationFailure::WrongSectionCount {
                expected: 3,
                found: 4
            }
            .to_string(),
            "expected 3 day sections, found 4"
        );
        assert_eq!(
            ValidationFailure::DayOutOfRange {
                day: 0,
                expected: 2
            }
            .to_string(),
            "Day 0 is outside the requested Day 1 to Day 2"
        );
    }

    #[test]
    fn failure_serializes_with_kind_tag() {
        let json = serde_json::to_value(ValidationFailure::EmptyBody { day: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "empty_body", "day": 3 }));
    }
}
