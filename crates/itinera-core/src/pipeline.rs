//! The generation pipeline: compose, invoke, validate.
//!
//! Stops at the first failing stage and tags the failure with that stage so
//! callers can render distinct error states. Validation failures are not
//! re-prompted; resubmitting is a new run and the caller's decision.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::client::{ModelClient, TokenUsage};
use crate::config::PipelineConfig;
use crate::constraints::ConstraintSet;
use crate::document::{CanonicalDocument, OutputValidator, ValidationFailure};
use crate::invoker::{AttemptFailure, InvocationFailure, ModelInvoker};
use crate::prompt::compose;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Prompt composition. Total, so never the source of a failure.
    Prompt,
    Invocation,
    Validation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prompt => "prompt",
            Self::Invocation => "invocation",
            Self::Validation => "validation",
        };
        f.write_str(s)
    }
}

/// A failed run, tagged by stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum GenerationFailure {
    #[error("{0}")]
    Invocation(InvocationFailure),

    #[error("response from {model} failed validation: {failure}")]
    Validation {
        /// Candidate whose response was rejected.
        model: String,
        failure: ValidationFailure,
    },
}

impl GenerationFailure {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Invocation(_) => Stage::Invocation,
            Self::Validation { .. } => Stage::Validation,
        }
    }
}

/// A validated itinerary and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPlan {
    pub document: CanonicalDocument,
    /// Candidate that produced the document.
    pub model: String,
    pub usage: Option<TokenUsage>,
    /// Candidates that failed before `model` answered.
    pub skipped: Vec<AttemptFailure>,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Success(GeneratedPlan),
    Failure(GenerationFailure),
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<GeneratedPlan, GenerationFailure> {
        match self {
            Self::Success(plan) => Ok(plan),
            Self::Failure(failure) => Err(failure),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Orchestrates one generation per [`GenerationPipeline::run`] call.
///
/// Holds only read-only state (client and config), so a single pipeline can
/// serve any number of independent runs.
#[derive(Clone)]
pub struct GenerationPipeline {
    client: Arc<dyn ModelClient>,
    config: PipelineConfig,
}

impl fmt::Debug for GenerationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationPipeline")
            .field("client", &self.client.name())
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationPipeline {
    pub fn new(client: Arc<dyn ModelClient>, config: PipelineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run compose, invoke and validate for one constraint set.
    pub async fn run(&self, constraints: &ConstraintSet) -> GenerationResult {
        let span = info_span!(
            "generation",
            run_id = %Uuid::new_v4(),
            destination = constraints.destination(),
            days = constraints.day_count(),
        );
        self.run_stages(constraints).instrument(span).await
    }

    async fn run_stages(&self, constraints: &ConstraintSet) -> GenerationResult {
        info!(
            candidates = self.config.candidates.len(),
            client = self.client.name(),
            "generation started"
        );

        let prompt = compose(constraints);

        let invoker = ModelInvoker::from_config(&self.config);
        let raw = match invoker
            .invoke(self.client.as_ref(), &prompt, &self.config.candidates)
            .await
        {
            Ok(raw) => raw,
            Err(failure) => {
                warn!(attempts = failure.attempts.len(), "no candidate produced a response");
                return GenerationResult::Failure(GenerationFailure::Invocation(failure));
            }
        };

        let validator = OutputValidator::from_config(&self.config);
        match validator.validate(&raw.text, constraints.day_count()) {
            Ok(document) => {
                info!(
                    model = %raw.model,
                    sections = document.sections.len(),
                    "generation succeeded"
                );
                GenerationResult::Success(GeneratedPlan {
                    document,
                    model: raw.model,
                    usage: raw.usage,
                    skipped: raw.skipped,
                })
            }
            Err(failure) => {
                warn!(model = %raw.model, error = %failure, "response failed validation");
                GenerationResult::Failure(GenerationFailure::Validation {
                    model: raw.model,
                    failure,
                })
            }
        }
    }
}
