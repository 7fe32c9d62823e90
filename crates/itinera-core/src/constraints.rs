//! User constraints for a single generation run.
//!
//! A [`ConstraintSet`] is built once per submission, validated at
//! construction, and read-only afterwards. The pipeline itself never rejects
//! one: range and emptiness checks are the caller's job and happen here.

use serde::Serialize;
use thiserror::Error;

/// Upper bound on trip length. Keeps both the prompt and the output bounded.
pub const MAX_DAYS: u32 = 30;

/// Errors from building a [`ConstraintSet`] out of raw user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("day count {value} is out of range (expected 1..={max})")]
    DayCountOutOfRange { value: u32, max: u32 },
}

/// Validated trip constraints.
///
/// Guardrails are hard constraints and take precedence over interests when
/// the two conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintSet {
    destination: String,
    day_count: u32,
    interests: Vec<String>,
    guardrails: Vec<String>,
}

impl ConstraintSet {
    /// Validate and normalize raw input.
    ///
    /// The destination and every list entry are trimmed; blank list entries
    /// are dropped. Order of the remaining entries is preserved.
    pub fn new(
        destination: impl Into<String>,
        day_count: u32,
        interests: Vec<String>,
        guardrails: Vec<String>,
    ) -> Result<Self, ConstraintError> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(ConstraintError::EmptyDestination);
        }
        if !(1..=MAX_DAYS).contains(&day_count) {
            return Err(ConstraintError::DayCountOutOfRange {
                value: day_count,
                max: MAX_DAYS,
            });
        }

        Ok(Self {
            destination,
            day_count,
            interests: clean_entries(interests),
            guardrails: clean_entries(guardrails),
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    pub fn interests(&self) -> &[String] {
        &self.interests
    }

    pub fn guardrails(&self) -> &[String] {
        &self.guardrails
    }
}

fn clean_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Split free-form list input ("Museums, Food; Nature") into entries.
///
/// Commas, semicolons and newlines all act as separators.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
