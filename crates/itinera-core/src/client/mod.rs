//! Model client interface for remote text-generation services.
//!
//! This module defines the [`ModelClient`] trait that every backend
//! implements, the request/response types it exchanges
//! ([`CompletionRequest`], [`Completion`], [`AttemptError`]), and the
//! OpenAI-compatible HTTP backend.
//!
//! # Architecture
//!
//! ```text
//! ModelInvoker
//!     |
//!     v
//! &dyn ModelClient --complete(request{model = candidate})--> Completion | AttemptError
//! ```

pub mod openai;
pub mod trait_def;
pub mod types;

pub use openai::OpenAiClient;
pub use trait_def::ModelClient;
pub use types::{AttemptError, Completion, CompletionRequest, TokenUsage};
