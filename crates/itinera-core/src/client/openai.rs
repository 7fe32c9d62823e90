//! OpenAI-compatible chat-completions client.
//!
//! Sends `POST {base_url}/chat/completions` with a system and a user message
//! and maps HTTP failures onto [`AttemptError`] variants.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};
use tracing::debug;

use super::trait_def::ModelClient;
use super::types::{AttemptError, Completion, CompletionRequest, TokenUsage};

const CLIENT_NAME: &str = "openai";

/// Longest slice of an error body kept in failure details.
const ERROR_SNIPPET_CHARS: usize = 200;

/// Client for any service speaking the OpenAI chat-completions protocol.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    http_client: HttpClient,
    request_timeout: Option<Duration>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Public OpenAI endpoint.
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, Self::DEFAULT_BASE_URL)
    }

    /// Point the client at another compatible endpoint (proxies, local servers, tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            http_client: HttpClient::new(),
            request_timeout: None,
        }
    }

    /// Bound each HTTP request so the connection is released when it expires.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn payload(request: &CompletionRequest) -> Value {
        json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_completion_tokens": request.max_output_tokens,
        })
    }

    fn send_error(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Timeout {
                after_ms: self
                    .request_timeout
                    .map(|t| t.as_millis() as u64)
                    .unwrap_or_default(),
            }
        } else {
            AttemptError::Transport {
                detail: format!("network error: {e}"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(ERROR_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

/// The body of an error response, or why it could not be read.
fn error_body<E: std::fmt::Display>(read: Result<String, E>) -> String {
    match read {
        Ok(body) => body,
        Err(e) => format!("(error body unreadable: {e})"),
    }
}

/// Map a non-success HTTP status onto an attempt failure.
fn classify_status(status: u16, body: &str) -> AttemptError {
    let detail = format!("HTTP {status}: {}", snippet(body));
    match status {
        401 | 403 => AttemptError::Auth { detail },
        429 => AttemptError::RateLimited { detail },
        _ if body.contains("quota") => AttemptError::RateLimited { detail },
        _ => AttemptError::Transport { detail },
    }
}

/// Pull the assistant text out of a chat-completions response.
///
/// `content` is usually a string, but some deployments return an array of
/// parts (plain strings or `{ "text": ... }` objects). Parts are joined with
/// newlines. Anything else yields an empty string.
fn extract_text(body: &Value) -> String {
    let Some(content) = body.pointer("/choices/0/message/content") else {
        return String::new();
    };

    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(s) => Some(s.as_str()),
                Value::Object(_) => part.get("text").and_then(|t| t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        _ => String::new(),
    }
}

fn extract_usage(body: &Value) -> Option<TokenUsage> {
    body.get("usage")
        .cloned()
        .and_then(|u| serde_json::from_value(u).ok())
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AttemptError> {
        let mut builder = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&Self::payload(request));
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = error_body(response.text().await);
            return Err(classify_status(status.as_u16(), &error_text));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.send_error(e)
            } else {
                AttemptError::Transport {
                    detail: format!("failed to parse response: {e}"),
                }
            }
        })?;

        let text = extract_text(&body);
        debug!(model = %request.model, chars = text.len(), "chat completion received");
        if text.trim().is_empty() {
            return Err(AttemptError::EmptyResponse);
        }

        Ok(Completion {
            text,
            usage: extract_usage(&body),
        })
    }
}
