//! Shared test utilities for itinera integration tests.
//!
//! Provides [`ScriptedClient`], a [`ModelClient`] whose answers are scripted
//! per candidate identifier and which records the order it was called in,
//! plus small fixtures for constraints and well-formed responses.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use itinera_core::{
    AttemptError, Completion, CompletionRequest, ConstraintSet, ModelCandidate, ModelClient,
    PipelineConfig,
};

/// Scripted behavior for one candidate.
#[derive(Debug, Clone)]
pub enum Script {
    /// Return this body.
    Reply(String),
    /// Fail with this cause.
    Fail(AttemptError),
    /// Sleep this long before replying, to trip attempt timeouts.
    Stall(Duration),
}

/// A fake backend that answers from a per-model script.
///
/// Models with no script fail with a transport error, so a test only has
/// to describe the candidates it cares about.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the response for one model identifier.
    pub fn with(mut self, model: &str, script: Script) -> Self {
        self.scripts.insert(model.to_string(), script);
        self
    }

    pub fn reply(self, model: &str, body: impl Into<String>) -> Self {
        self.with(model, Script::Reply(body.into()))
    }

    pub fn fail(self, model: &str, cause: AttemptError) -> Self {
        self.with(model, Script::Fail(cause))
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    /// Model identifiers called so far, in order.
    pub fn called_models(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.model).collect()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AttemptError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(request.clone());

        match self.scripts.get(&request.model) {
            Some(Script::Reply(body)) => Ok(Completion::new(body.clone())),
            Some(Script::Fail(cause)) => Err(cause.clone()),
            Some(Script::Stall(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(Completion::new(well_formed_itinerary(1)))
            }
            None => Err(transport_error()),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A generic connection failure.
pub fn transport_error() -> AttemptError {
    AttemptError::Transport {
        detail: "connection refused".to_string(),
    }
}

/// Kyoto, 2 days, temples, wheelchair accessible.
pub fn kyoto_constraints() -> ConstraintSet {
    ConstraintSet::new(
        "Kyoto",
        2,
        vec!["temples".to_string()],
        vec!["wheelchair accessible".to_string()],
    )
    .expect("fixture constraints are valid")
}

/// A response with `days` well-formed day sections.
pub fn well_formed_itinerary(days: u32) -> String {
    (1..=days)
        .map(|d| {
            format!(
                "## Day {d}: Area {d}\n\
                 **Morning**\n\
                 - Accessible temple garden {d}\n\
                 **Afternoon**\n\
                 - Museum {d} with step-free entrance\n\
                 **Evening**\n\
                 - Dinner at restaurant {d}\n"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Candidates named `ids`, in order, with a small token bound.
pub fn candidates(ids: &[&str]) -> Vec<ModelCandidate> {
    ids.iter().map(|id| ModelCandidate::new(*id, 512)).collect()
}

/// Pipeline config over `ids` with a short attempt timeout.
pub fn test_config(ids: &[&str]) -> PipelineConfig {
    PipelineConfig {
        attempt_timeout: Duration::from_millis(200),
        ..PipelineConfig::with_candidates(candidates(ids))
    }
}
