//! Rendering a generated plan for stdout or an export file.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::Serialize;

use itinera_core::{ConstraintSet, GeneratedPlan, TokenUsage};

/// Output format for `itinera generate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// The canonical Markdown document.
    Markdown,
    /// The full plan (sections, model, usage) as JSON.
    Json,
}

/// Render the plan for stdout in the requested format.
pub fn render(plan: &GeneratedPlan, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(plan.document.raw.clone()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(plan)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Render the Markdown export written by `--output`.
///
/// The header carries the destination, the generation time and the model;
/// the body is the canonical document unchanged.
pub fn render_markdown_export(
    plan: &GeneratedPlan,
    constraints: &ConstraintSet,
    generated_at: NaiveDateTime,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Travel Plan: {}", constraints.destination());
    out.push('\n');
    let _ = writeln!(out, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "Model: {}", plan.model);
    if let Some(usage) = plan.usage {
        let _ = writeln!(out, "Tokens: {}", usage_line(&usage));
    }
    out.push('\n');
    out.push_str(&plan.document.raw);
    out
}

fn usage_line(usage: &TokenUsage) -> String {
    format!(
        "{} prompt + {} completion = {} total",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    )
}

/// JSON shape printed by `itinera prompt --json`.
#[derive(Debug, Serialize)]
pub struct PromptDump<'a> {
    pub constraints: &'a ConstraintSet,
    pub system: &'a str,
    pub user: &'a str,
}
