//! Output-contract validation for generated itineraries.
//!
//! Walks the response line by line with a two-state machine (before the
//! first day marker, inside a day section) and then checks, in order:
//! - The response is non-empty after trimming.
//! - The response fits the configured length bound.
//! - Day markers run exactly `1..=day_count`, ascending, with no gaps or
//!   duplicates.
//! - No section body is empty.
//!
//! A *day marker* is a line that reads `Day <n>` once leading `#` and
//! emphasis characters are removed, optionally followed by a separator
//! (`:`, `-`, `–`, `—`, `.`, `(`, `)`) and a title.

use std::collections::HashSet;

use tracing::debug;

use super::{CanonicalDocument, DaySection, ValidationFailure, default_title};
use crate::config::PipelineConfig;

const TITLE_SEPARATORS: [char; 7] = [':', '-', '–', '—', '.', '(', ')'];
const EMPHASIS: [char; 2] = ['*', '_'];
const BULLET_GLYPHS: [char; 4] = ['-', '*', '+', '•'];

/// Validate with the default length bound.
pub fn validate(raw: &str, day_count: u32) -> Result<CanonicalDocument, ValidationFailure> {
    OutputValidator::default().validate(raw, day_count)
}

/// Checks generated text against the day-section contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputValidator {
    max_document_chars: usize,
}

impl Default for OutputValidator {
    fn default() -> Self {
        Self::new(PipelineConfig::DEFAULT_MAX_DOCUMENT_CHARS)
    }
}

impl OutputValidator {
    pub fn new(max_document_chars: usize) -> Self {
        Self { max_document_chars }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.max_document_chars)
    }

    /// Validate `raw` and normalize it into a [`CanonicalDocument`].
    pub fn validate(
        &self,
        raw: &str,
        day_count: u32,
    ) -> Result<CanonicalDocument, ValidationFailure> {
        if raw.trim().is_empty() {
            return Err(ValidationFailure::EmptyDocument);
        }

        let actual = raw.chars().count();
        if actual > self.max_document_chars {
            return Err(ValidationFailure::TooLong {
                limit: self.max_document_chars,
                actual,
            });
        }

        let walk = walk_sections(raw);
        if walk.preamble_lines > 0 {
            debug!(lines = walk.preamble_lines, "discarding text before Day 1");
        }

        let days: Vec<u32> = walk.sections.iter().map(|s| s.day).collect();
        check_markers(&days, day_count)?;

        let mut sections = Vec::with_capacity(walk.sections.len());
        for open in walk.sections {
            let body = normalize_body(&open.body);
            if body.is_empty() {
                return Err(ValidationFailure::EmptyBody { day: open.day });
            }
            sections.push(DaySection {
                day: open.day,
                title: open.title.unwrap_or_else(|| default_title(open.day)),
                body,
            });
        }

        Ok(CanonicalDocument::from_sections(sections))
    }
}

// ---------------------------------------------------------------------------
// Marker recognition
// ---------------------------------------------------------------------------

/// A recognized `Day <n>` heading line.
#[derive(Debug, PartialEq, Eq)]
struct Marker {
    day: u32,
    title: Option<String>,
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}

fn clean_title(raw: &str) -> Option<String> {
    let title = raw
        .trim()
        .trim_end_matches('#')
        .trim_matches(|c: char| c.is_whitespace() || EMPHASIS.contains(&c))
        .trim();
    (!title.is_empty()).then(|| title.to_string())
}

fn parse_marker(line: &str) -> Option<Marker> {
    let s = line.trim().trim_start_matches('#').trim_start();

    // Emphasis must hug the text; "* Day 2" is a bullet, "*Day 2*" is not.
    let unemphasized = s.trim_start_matches(EMPHASIS);
    if unemphasized.len() != s.len() && unemphasized.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = strip_prefix_ignore_case(unemphasized, "day")?.trim_start();
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let day: u32 = rest[..digits_end].parse().ok()?;

    let tail = rest[digits_end..]
        .trim_start_matches(|c: char| c.is_whitespace() || EMPHASIS.contains(&c));
    if tail.is_empty() {
        return Some(Marker { day, title: None });
    }

    let sep = tail.chars().next().filter(|c| TITLE_SEPARATORS.contains(c))?;
    let mut title = clean_title(&tail[sep.len_utf8()..]);
    // "Day 7 (Rest day)": the closing paren belongs to the separator.
    if sep == '(' {
        title = title.and_then(|t| clean_title(t.strip_suffix(')').unwrap_or(&t)));
    }
    Some(Marker { day, title })
}

// ---------------------------------------------------------------------------
// Section walk
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenSection<'a> {
    day: u32,
    title: Option<String>,
    body: Vec<&'a str>,
}

#[derive(Debug)]
enum WalkState<'a> {
    Preamble,
    InSection(OpenSection<'a>),
}

#[derive(Debug, Default)]
struct Walk<'a> {
    preamble_lines: usize,
    sections: Vec<OpenSection<'a>>,
}

fn walk_sections(raw: &str) -> Walk<'_> {
    let mut walk = Walk::default();
    let mut state = WalkState::Preamble;

    for line in raw.lines() {
        let marker = parse_marker(line);
        state = match (state, marker) {
            (WalkState::Preamble, None) => {
                if !line.trim().is_empty() {
                    walk.preamble_lines += 1;
                }
                WalkState::Preamble
            }
            (WalkState::InSection(mut open), None) => {
                open.body.push(line);
                WalkState::InSection(open)
            }
            (previous, Some(Marker { day, title })) => {
                if let WalkState::InSection(open) = previous {
                    walk.sections.push(open);
                }
                WalkState::InSection(OpenSection {
                    day,
                    title,
                    body: Vec::new(),
                })
            }
        };
    }

    if let WalkState::InSection(open) = state {
        walk.sections.push(open);
    }
    walk
}

/// Markers must be exactly `1..=expected`, in order. Day numbers above
/// `expected` only count as surplus when there are too many markers;
/// otherwise the first day not in place is reported missing.
fn check_markers(days: &[u32], expected: u32) -> Result<(), ValidationFailure> {
    if days.is_empty() {
        return Err(ValidationFailure::WrongSectionCount { expected, found: 0 });
    }

    let mut seen = HashSet::new();
    let mut next = 1;
    for &day in days {
        if !seen.insert(day) {
            return Err(ValidationFailure::DuplicateSection { day });
        }
        if day == 0 {
            return Err(ValidationFailure::DayOutOfRange { day, expected });
        }
        if day > expected && days.len() > expected as usize {
            return Err(ValidationFailure::WrongSectionCount {
                expected,
                found: days.len(),
            });
        }
        if day != next {
            return Err(ValidationFailure::MissingSection { day: next });
        }
        next += 1;
    }

    if next <= expected {
        return Err(ValidationFailure::MissingSection { day: next });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

fn is_horizontal_rule(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&c| t.chars().all(|ch| ch == c || ch == ' ') && t.contains(c))
}

fn normalize_bullet(line: &str) -> String {
    let content = line.trim_start();
    let indent = &line[..line.len() - content.len()];

    for glyph in BULLET_GLYPHS {
        if let Some(item) = content.strip_prefix(glyph) {
            if glyph == '•' || item.starts_with(char::is_whitespace) {
                return format!("{indent}- {}", item.trim_start());
            }
        }
    }
    line.to_string()
}

/// Trim trailing whitespace, unify bullet glyphs, drop horizontal rules, and
/// collapse blank-line runs. Leading and trailing blank lines are removed.
fn normalize_body(lines: &[&str]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending_blank = false;

    for line in lines {
        let line = line.trim_end();
        if line.trim().is_empty() || is_horizontal_rule(line) {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push(String::new());
            pending_blank = false;
        }
        out.push(normalize_bullet(line));
    }

    out.join("\n")
}
