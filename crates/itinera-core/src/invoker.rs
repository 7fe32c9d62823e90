//! Ordered model invocation with fallback.
//!
//! Candidates are tried strictly in order, one attempt each. The first
//! candidate that returns a usable body wins and the rest are skipped. When
//! every candidate fails, the caller gets one recorded cause per attempt, in
//! attempt order.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::{AttemptError, Completion, CompletionRequest, ModelClient, TokenUsage};
use crate::config::{ModelCandidate, PipelineConfig};
use crate::prompt::PromptPair;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One failed attempt: which candidate, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub candidate: String,
    pub cause: AttemptError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.candidate, self.cause)
    }
}

/// The winning response plus what it took to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub text: String,
    /// Identifier of the candidate that answered.
    pub model: String,
    pub usage: Option<TokenUsage>,
    /// Candidates that failed before the winner, in attempt order.
    pub skipped: Vec<AttemptFailure>,
}

/// Every candidate was attempted and none produced a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationFailure {
    /// One entry per attempted candidate, in attempt order.
    pub attempts: Vec<AttemptFailure>,
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "no model candidates configured");
        }
        write!(f, "all {} model candidates failed", self.attempts.len())?;
        for (i, attempt) in self.attempts.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{attempt}")?;
        }
        Ok(())
    }
}

impl std::error::Error for InvocationFailure {}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

/// Runs the fallback loop against a [`ModelClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInvoker {
    attempt_timeout: Duration,
    min_response_chars: usize,
}

impl ModelInvoker {
    pub fn new(attempt_timeout: Duration) -> Self {
        Self {
            attempt_timeout,
            min_response_chars: PipelineConfig::DEFAULT_MIN_RESPONSE_CHARS,
        }
    }

    /// Treat bodies shorter than `chars` (after trimming) as empty.
    pub fn with_min_response_chars(mut self, chars: usize) -> Self {
        self.min_response_chars = chars;
        self
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.attempt_timeout).with_min_response_chars(config.min_response_chars)
    }

    /// Try each candidate in order until one returns a usable body.
    pub async fn invoke(
        &self,
        client: &dyn ModelClient,
        prompt: &PromptPair,
        candidates: &[ModelCandidate],
    ) -> Result<RawResponse, InvocationFailure> {
        let mut failures = Vec::new();

        for candidate in candidates {
            match self.attempt(client, prompt, candidate).await {
                Ok(completion) => {
                    info!(
                        candidate = %candidate.identifier,
                        skipped = failures.len(),
                        "candidate produced a response"
                    );
                    return Ok(RawResponse {
                        text: completion.text,
                        model: candidate.identifier.clone(),
                        usage: completion.usage,
                        skipped: failures,
                    });
                }
                Err(cause) => {
                    warn!(
                        candidate = %candidate.identifier,
                        cause = cause.label(),
                        error = %cause,
                        "candidate failed, falling back"
                    );
                    failures.push(AttemptFailure {
                        candidate: candidate.identifier.clone(),
                        cause,
                    });
                }
            }
        }

        Err(InvocationFailure { attempts: failures })
    }

    /// One bounded attempt against one candidate.
    async fn attempt(
        &self,
        client: &dyn ModelClient,
        prompt: &PromptPair,
        candidate: &ModelCandidate,
    ) -> Result<Completion, AttemptError> {
        let request = CompletionRequest {
            model: candidate.identifier.clone(),
            system: prompt.system_instruction.clone(),
            user: prompt.user_instruction.clone(),
            max_output_tokens: candidate.max_output_tokens,
        };

        let completion = match tokio::time::timeout(self.attempt_timeout, client.complete(&request))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AttemptError::Timeout {
                    after_ms: self.attempt_timeout.as_millis() as u64,
                });
            }
        };

        if completion.text.trim().chars().count() < self.min_response_chars.max(1) {
            return Err(AttemptError::EmptyResponse);
        }
        Ok(completion)
    }
}

// ---------------------------------------------------------------------------
// Connectivity check
// ---------------------------------------------------------------------------

const PING_SYSTEM: &str = "You are a connectivity check. Follow the instruction exactly.";
const PING_USER: &str = "Reply with the single word: READY";
const PING_MAX_TOKENS: u32 = 10;

/// Send a tiny request to one candidate and return its trimmed reply.
///
/// Used to check credentials and model access without running a full
/// generation.
pub async fn ping(
    client: &dyn ModelClient,
    candidate: &ModelCandidate,
    timeout: Duration,
) -> Result<String, AttemptError> {
    let request = CompletionRequest {
        model: candidate.identifier.clone(),
        system: PING_SYSTEM.to_string(),
        user: PING_USER.to_string(),
        max_output_tokens: PING_MAX_TOKENS,
    };

    let completion = tokio::time::timeout(timeout, client.complete(&request))
        .await
        .map_err(|_| AttemptError::Timeout {
            after_ms: timeout.as_millis() as u64,
        })??;

    let reply = completion.text.trim().to_string();
    if reply.is_empty() {
        return Err(AttemptError::EmptyResponse);
    }
    Ok(reply)
}
