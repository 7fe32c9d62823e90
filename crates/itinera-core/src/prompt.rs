//! Prompt composition: constraints in, (system, user) instruction pair out.
//!
//! Everything here is pure. Equal constraint sets always produce byte-equal
//! prompt pairs, which is what makes the rest of the pipeline testable even
//! though the model call itself is not deterministic.

use serde::Serialize;

use crate::constraints::ConstraintSet;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The two role-tagged texts sent on every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    /// Fixed role and output ruleset. Varies only with the day count.
    pub system_instruction: String,
    /// Constraint-specific task text.
    pub user_instruction: String,
}

// ---------------------------------------------------------------------------
// System instruction
// ---------------------------------------------------------------------------

/// Planning rules included in every system instruction.
const PLANNING_RULES: &str = r#"## Planning Rules

- Guardrails are hard constraints. When a guardrail conflicts with an interest, the guardrail wins (a "no walking tours" guardrail overrides a "hiking" interest).
- If a guardrail asks for wheelchair-accessible or kids-friendly activities, every suggestion must respect it.
- Group each day into Morning, Afternoon and Evening, with 4-8 bullet items in total per day.
- Keep each day geographically coherent: cluster activities by area.
- Include at least one low-energy option per day (a cafe, a scenic view, a market).
- Include food suggestions when the interests mention food or cuisine.
- Avoid unsafe or illegal activities. Do not give medical advice.
- If the destination is ambiguous, assume the most common city or country match.
"#;

fn build_system_instruction(day_count: u32) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str("# Travel Planner\n\n");
    prompt.push_str(
        "You are a practical travel planner. You turn a destination, a trip length, \
         interests and guardrails into a day-by-day itinerary.\n\n",
    );

    prompt.push_str("## Output Format\n\n");
    prompt.push_str(&format!(
        "- Output Markdown with exactly {day_count} day sections, Day 1 through Day {day_count}, in order.\n"
    ));
    prompt.push_str(
        "- Start each section with a level-two heading of the form `## Day N: Short Title`.\n",
    );
    prompt.push_str("- Under each heading, list activities as `- ` bullet points with a short label and a one-line detail.\n");
    prompt.push_str("- Every day section must contain at least one activity.\n");
    prompt.push_str(
        "- Do not write any preamble before Day 1 or any closing notes after the last day.\n\n",
    );

    prompt.push_str(PLANNING_RULES);
    prompt
}

// ---------------------------------------------------------------------------
// User instruction
// ---------------------------------------------------------------------------

fn format_list(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join("; ")
    }
}

fn build_user_instruction(constraints: &ConstraintSet) -> String {
    let days = constraints.day_count();
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("TRIP INPUTS\n");
    prompt.push_str(&format!("- Destination: {}\n", constraints.destination()));
    prompt.push_str(&format!("- Number of days: {days}\n"));
    prompt.push_str(&format!(
        "- Special interests: {}\n",
        format_list(constraints.interests())
    ));
    prompt.push_str(&format!(
        "- Guardrails / constraints: {}\n\n",
        format_list(constraints.guardrails())
    ));

    prompt.push_str("INSTRUCTIONS\n");
    prompt.push_str(&format!(
        "- Generate a complete plan for {days} days (Day 1..Day {days}).\n"
    ));
    prompt.push_str("- Balance activity density evenly across days.\n");
    prompt.push_str("- Do not repeat the same named activity on two different days.\n");
    prompt.push_str(
        "- Keep each day self-contained: no forward or backward references such as \"see Day 3\".\n",
    );
    prompt.push_str("- Guardrails override interests whenever they conflict.\n");

    prompt
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Compose the prompt pair for a constraint set.
pub fn compose(constraints: &ConstraintSet) -> PromptPair {
    PromptPair {
        system_instruction: build_system_instruction(constraints.day_count()),
        user_instruction: build_user_instruction(constraints),
    }
}
