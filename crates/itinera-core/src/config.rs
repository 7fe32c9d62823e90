use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One remote model to try, in fallback order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// Model identifier sent to the service (e.g. `gpt-5-mini`).
    pub identifier: String,
    /// Upper bound on generated tokens for this candidate.
    #[serde(default = "ModelCandidate::default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl ModelCandidate {
    /// Token bound used when a candidate does not specify one.
    pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2200;

    pub fn new(identifier: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            identifier: identifier.into(),
            max_output_tokens,
        }
    }

    fn default_max_output_tokens() -> u32 {
        Self::DEFAULT_MAX_OUTPUT_TOKENS
    }

    /// The built-in fallback list, primary first.
    pub fn default_list() -> Vec<Self> {
        ["gpt-5", "gpt-5-mini", "gpt-4.1"]
            .into_iter()
            .map(|id| Self::new(id, Self::DEFAULT_MAX_OUTPUT_TOKENS))
            .collect()
    }

    /// Parse a comma-separated identifier list (`"gpt-5,gpt-4.1"`) using the
    /// default token bound for each entry.
    pub fn parse_list(input: &str) -> Vec<Self> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|id| Self::new(id, Self::DEFAULT_MAX_OUTPUT_TOKENS))
            .collect()
    }
}

/// Everything the pipeline needs besides the client, resolved once and
/// injected at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Candidates in fallback order.
    pub candidates: Vec<ModelCandidate>,
    /// Bound on each individual attempt.
    pub attempt_timeout: Duration,
    /// Bodies shorter than this (after trimming) count as empty.
    pub min_response_chars: usize,
    /// Longest document the validator accepts.
    pub max_document_chars: usize,
}

impl PipelineConfig {
    pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(120);
    pub const DEFAULT_MIN_RESPONSE_CHARS: usize = 16;
    pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 60_000;

    /// Default tuning with an explicit candidate list.
    pub fn with_candidates(candidates: Vec<ModelCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidates: ModelCandidate::default_list(),
            attempt_timeout: Self::DEFAULT_ATTEMPT_TIMEOUT,
            min_response_chars: Self::DEFAULT_MIN_RESPONSE_CHARS,
            max_document_chars: Self::DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }
}
