//! End-to-end tests for the generation pipeline against scripted backends.

use std::sync::Arc;
use std::time::Duration;

use itinera_core::{
    AttemptError, GenerationFailure, GenerationPipeline, GenerationResult, ModelInvoker, Stage,
    ValidationFailure, compose,
};
use itinera_test_utils::{
    Script, ScriptedClient, candidates, kyoto_constraints, test_config, transport_error,
    well_formed_itinerary,
};

fn pipeline(client: Arc<ScriptedClient>, ids: &[&str]) -> GenerationPipeline {
    GenerationPipeline::new(client, test_config(ids))
}

// ===========================================================================
// Invoker properties
// ===========================================================================

#[tokio::test]
async fn k_failures_then_success_makes_k_plus_one_attempts() {
    let client = ScriptedClient::new()
        .fail("m1", transport_error())
        .fail("m2", AttemptError::RateLimited { detail: "429".into() })
        .reply("m3", well_formed_itinerary(2))
        .reply("m4", well_formed_itinerary(2));
    let prompt = compose(&kyoto_constraints());

    let raw = ModelInvoker::new(Duration::from_secs(1))
        .invoke(&client, &prompt, &candidates(&["m1", "m2", "m3", "m4"]))
        .await
        .unwrap();

    assert_eq!(client.called_models(), vec!["m1", "m2", "m3"]);
    assert_eq!(raw.model, "m3");
    assert_eq!(raw.text, well_formed_itinerary(2));
}

#[tokio::test]
async fn n_failures_report_n_causes_in_order() {
    let client = ScriptedClient::new()
        .fail("m1", AttemptError::Auth { detail: "401".into() })
        .with("m2", Script::Stall(Duration::from_secs(5)))
        .reply("m3", "");
    let prompt = compose(&kyoto_constraints());

    let failure = ModelInvoker::new(Duration::from_millis(100))
        .invoke(&client, &prompt, &candidates(&["m1", "m2", "m3"]))
        .await
        .unwrap_err();

    assert_eq!(failure.attempts.len(), 3);
    assert_eq!(failure.attempts[0].candidate, "m1");
    assert!(matches!(failure.attempts[0].cause, AttemptError::Auth { .. }));
    assert_eq!(failure.attempts[1].cause, AttemptError::Timeout { after_ms: 100 });
    assert_eq!(failure.attempts[2].cause, AttemptError::EmptyResponse);
}

#[tokio::test]
async fn every_attempt_shares_the_prompt_and_uses_its_token_bound() {
    let client = ScriptedClient::new().reply("m2", well_formed_itinerary(2));
    let prompt = compose(&kyoto_constraints());

    ModelInvoker::new(Duration::from_secs(1))
        .invoke(&client, &prompt, &candidates(&["m1", "m2"]))
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.system, prompt.system_instruction);
        assert_eq!(request.user, prompt.user_instruction);
        assert_eq!(request.max_output_tokens, 512);
    }
}

// ===========================================================================
// Pipeline scenarios
// ===========================================================================

#[tokio::test]
async fn kyoto_single_candidate_succeeds() {
    let client = Arc::new(ScriptedClient::new().reply("primary", well_formed_itinerary(2)));

    let result = pipeline(client.clone(), &["primary"])
        .run(&kyoto_constraints())
        .await;

    let GenerationResult::Success(plan) = result else {
        panic!("expected success");
    };
    assert_eq!(plan.document.sections.len(), 2);
    assert_eq!(plan.model, "primary");
    assert!(plan.document.raw.starts_with("## Day 1: Area 1\n\n"));

    let requests = client.requests();
    assert!(requests[0].user.contains("Kyoto"));
    assert!(requests[0].user.contains("wheelchair accessible"));
}

#[tokio::test]
async fn kyoto_all_transport_errors_fail_at_invocation_stage() {
    let client = Arc::new(
        ScriptedClient::new()
            .fail("a", transport_error())
            .fail("b", transport_error())
            .fail("c", transport_error()),
    );

    let result = pipeline(client.clone(), &["a", "b", "c"])
        .run(&kyoto_constraints())
        .await;

    let GenerationResult::Failure(failure) = result else {
        panic!("expected failure");
    };
    assert_eq!(failure.stage(), Stage::Invocation);
    let GenerationFailure::Invocation(invocation) = failure else {
        panic!("expected invocation failure");
    };
    assert_eq!(invocation.attempts.len(), 3);
    assert!(
        invocation
            .attempts
            .iter()
            .all(|a| matches!(a.cause, AttemptError::Transport { .. }))
    );
    assert_eq!(client.called_models(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn fallback_success_reports_skipped_candidates() {
    let client = Arc::new(
        ScriptedClient::new()
            .fail("gpt-5", AttemptError::RateLimited { detail: "quota".into() })
            .reply("gpt-5-mini", well_formed_itinerary(2)),
    );

    let plan = pipeline(client, &["gpt-5", "gpt-5-mini", "gpt-4.1"])
        .run(&kyoto_constraints())
        .await
        .into_result()
        .unwrap();

    assert_eq!(plan.model, "gpt-5-mini");
    assert_eq!(plan.skipped.len(), 1);
    assert_eq!(plan.skipped[0].candidate, "gpt-5");
}

#[tokio::test]
async fn malformed_response_fails_at_validation_without_reprompting() {
    let client = Arc::new(
        ScriptedClient::new()
            .reply("primary", well_formed_itinerary(1))
            .reply("secondary", well_formed_itinerary(2)),
    );

    let failure = pipeline(client.clone(), &["primary", "secondary"])
        .run(&kyoto_constraints())
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(failure.stage(), Stage::Validation);
    assert_eq!(
        failure,
        GenerationFailure::Validation {
            model: "primary".into(),
            failure: ValidationFailure::MissingSection { day: 2 },
        }
    );
    // The secondary candidate is never consulted for a structurally bad answer.
    assert_eq!(client.called_models(), vec!["primary"]);
}

#[tokio::test]
async fn failed_run_leaves_pipeline_ready_for_next() {
    let client = Arc::new(ScriptedClient::new().reply("primary", well_formed_itinerary(2)));
    let pipeline = pipeline(client, &["primary"]);

    let three_days = itinera_core::ConstraintSet::new("Kyoto", 3, vec![], vec![]).unwrap();
    assert!(!pipeline.run(&three_days).await.is_success());
    assert!(pipeline.run(&kyoto_constraints()).await.is_success());
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let client = Arc::new(ScriptedClient::new().reply("primary", well_formed_itinerary(2)));
    let pipeline = pipeline(client.clone(), &["primary"]);

    let constraints = kyoto_constraints();
    let (a, b) = tokio::join!(pipeline.run(&constraints), pipeline.run(&constraints));

    assert_eq!(a, b);
    assert_eq!(client.called_models().len(), 2);
}
