//! Types exchanged between the invoker and a [`super::ModelClient`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One bounded generation request against a single candidate model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Candidate model identifier (e.g. `gpt-5-mini`).
    pub model: String,
    /// Role context, sent with the `system` role.
    pub system: String,
    /// Task text, sent with the `user` role.
    pub user: String,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
}

/// Token accounting reported by the service, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Why a single candidate attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptError {
    #[error("authentication failed: {detail}")]
    Auth { detail: String },

    #[error("rate limited: {detail}")]
    RateLimited { detail: String },

    #[error("timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("empty response")]
    EmptyResponse,

    #[error("transport error: {detail}")]
    Transport { detail: String },
}

impl AttemptError {
    /// Short, stable label for logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::EmptyResponse => "empty_response",
            Self::Transport { .. } => "transport",
        }
    }
}
