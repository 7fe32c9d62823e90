//! Constrained itinerary generation.
//!
//! The pipeline turns a [`ConstraintSet`] into a validated
//! [`CanonicalDocument`] in three stages:
//!
//! ```text
//! ConstraintSet --compose--> PromptPair --invoke--> RawResponse --validate--> CanonicalDocument
//!                                           |
//!                              ModelClient (candidate 1, 2, ... N)
//! ```
//!
//! Prompt composition and validation are pure. Only the invoker touches the
//! network, through the [`ModelClient`] trait.

pub mod client;
pub mod config;
pub mod constraints;
pub mod document;
pub mod invoker;
pub mod pipeline;
pub mod prompt;

pub use client::{
    AttemptError, Completion, CompletionRequest, ModelClient, OpenAiClient,
    TokenUsage,
};
pub use config::{ModelCandidate, PipelineConfig};
pub use constraints::{ConstraintError, ConstraintSet, MAX_DAYS, split_list};
pub use document::{CanonicalDocument, DaySection, ValidationFailure, validate};
pub use invoker::{AttemptFailure, InvocationFailure, ModelInvoker, RawResponse, ping};
pub use pipeline::{GeneratedPlan, GenerationFailure, GenerationPipeline, GenerationResult, Stage};
pub use prompt::{PromptPair, compose};
