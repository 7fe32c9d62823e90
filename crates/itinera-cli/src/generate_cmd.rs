//! `itinera generate` and `itinera prompt`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};

use itinera_core::{
    ConstraintSet, GenerationFailure, GenerationPipeline, GenerationResult, ModelClient,
    OpenAiClient, compose, split_list,
};

use crate::config::ItineraConfig;
use crate::export::{self, OutputFormat, PromptDump};

/// Trip inputs shared by `generate` and `prompt`.
#[derive(Debug, Clone, clap::Args)]
pub struct TripArgs {
    /// Destination city or region (passed to the model verbatim)
    #[arg(long)]
    pub destination: String,
    /// Number of days (1-30)
    #[arg(long, default_value_t = 3)]
    pub days: u32,
    /// Special interests, comma/semicolon separated or repeated
    #[arg(long)]
    pub interests: Vec<String>,
    /// Hard constraints that override interests, comma/semicolon separated or repeated
    #[arg(long)]
    pub guardrails: Vec<String>,
}

impl TripArgs {
    pub fn to_constraints(&self) -> Result<ConstraintSet> {
        let interests = self.interests.iter().flat_map(|s| split_list(s)).collect();
        let guardrails = self.guardrails.iter().flat_map(|s| split_list(s)).collect();
        ConstraintSet::new(self.destination.as_str(), self.days, interests, guardrails)
            .context("invalid trip inputs")
    }
}

/// Build the model client for the configured backend.
pub fn build_client(config: &ItineraConfig) -> Result<Arc<dyn ModelClient>> {
    let client: Arc<dyn ModelClient> = match config.backend.as_str() {
        "openai" => {
            let api_key = config.require_api_key()?;
            Arc::new(
                OpenAiClient::with_base_url(api_key, config.base_url.as_str())
                    .with_request_timeout(config.pipeline.attempt_timeout),
            )
        }
        other => bail!("unknown backend {other:?} (available: openai)"),
    };
    Ok(client)
}

/// Run one generation and print (and optionally export) the result.
pub async fn run_generate(
    config: &ItineraConfig,
    trip: &TripArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let constraints = trip.to_constraints()?;
    let client = build_client(config)?;
    let pipeline = GenerationPipeline::new(client, config.pipeline.clone());

    eprintln!(
        "Planning {} day(s) in {}...",
        constraints.day_count(),
        constraints.destination()
    );

    let plan = match pipeline.run(&constraints).await {
        GenerationResult::Success(plan) => plan,
        GenerationResult::Failure(failure) => return Err(describe_failure(&failure)),
    };

    for skipped in &plan.skipped {
        eprintln!("  {} skipped: {}", skipped.candidate, skipped.cause);
    }
    eprintln!("Generated with {}.", plan.model);

    if let Some(path) = output {
        let generated_at = chrono::Local::now().naive_local();
        let contents = export::render_markdown_export(&plan, &constraints, generated_at);
        std::fs::write(path, contents)
            .with_context(|| format!("cannot write output file: {}", path.display()))?;
        eprintln!("Exported plan to {}", path.display());
    }

    print!("{}", export::render(&plan, format)?);
    Ok(())
}

/// Turn a pipeline failure into a message that says what to do next.
fn describe_failure(failure: &GenerationFailure) -> anyhow::Error {
    match failure {
        GenerationFailure::Invocation(invocation) => {
            let mut msg = String::from("no model produced an itinerary");
            if invocation.attempts.is_empty() {
                msg.push_str(": no candidate models configured");
            }
            for attempt in &invocation.attempts {
                msg.push_str(&format!("\n  {}: {}", attempt.candidate, attempt.cause));
            }
            msg.push_str("\nRun `itinera self-test` to check the API key and model access.");
            anyhow!(msg)
        }
        GenerationFailure::Validation { model, failure } => anyhow!(
            "{model} returned an itinerary that did not match the requested layout: {failure}\n\
             Run the command again to request a new itinerary."
        ),
    }
}

/// Print the composed prompt pair without contacting the service.
pub fn run_prompt(trip: &TripArgs, json: bool) -> Result<()> {
    let constraints = trip.to_constraints()?;
    let prompt = compose(&constraints);

    if json {
        let dump = PromptDump {
            constraints: &constraints,
            system: &prompt.system_instruction,
            user: &prompt.user_instruction,
        };
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        println!("=== system ===");
        println!("{}", prompt.system_instruction);
        println!();
        println!("=== user ===");
        println!("{}", prompt.user_instruction);
    }
    Ok(())
}

/// Resolve `--output`, refusing to silently treat a directory as a file.
pub fn output_path(output: Option<PathBuf>) -> Result<Option<PathBuf>> {
    match output {
        Some(path) if path.is_dir() => {
            bail!("output path {} is a directory", path.display())
        }
        other => Ok(other),
    }
}
