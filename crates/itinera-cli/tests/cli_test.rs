//! Runs the `itinera` binary end to end against a mock completions server.

use std::path::Path;
use std::process::{Command, Output};

use itinera_test_utils::well_formed_itinerary;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build an `itinera` invocation isolated from the caller's config and keys.
fn itinera(config_home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_itinera"));
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("ITINERA_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("ITINERA_BASE_URL")
        .env_remove("ITINERA_MODELS")
        .env_remove("ITINERA_TIMEOUT_SECS")
        .env("RUST_LOG", "warn");
    cmd
}

async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().expect("failed to spawn itinera"))
        .await
        .expect("spawn_blocking panicked")
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 420, "completion_tokens": 380, "total_tokens": 800 }
    })
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn prompt_prints_both_instructions_without_network() {
    let home = TempDir::new().unwrap();
    let output = itinera(home.path())
        .args([
            "prompt",
            "--destination",
            "Kyoto",
            "--days",
            "2",
            "--interests",
            "temples",
            "--guardrails",
            "wheelchair accessible",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("=== system ==="));
    assert!(out.contains("=== user ==="));
    assert!(out.contains("Kyoto"));
    assert!(out.contains("wheelchair accessible"));
}

#[test]
fn out_of_range_days_is_rejected() {
    let home = TempDir::new().unwrap();
    let output = itinera(home.path())
        .args(["prompt", "--destination", "Kyoto", "--days", "45"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid trip inputs"));
}

#[test]
fn generate_without_api_key_explains_setup() {
    let home = TempDir::new().unwrap();
    let output = itinera(home.path())
        .args(["generate", "--destination", "Kyoto", "--days", "2"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("ITINERA_API_KEY"), "stderr: {err}");
    assert!(err.contains("itinera init"), "stderr: {err}");
}

#[test]
fn init_writes_config_used_by_models() {
    let home = TempDir::new().unwrap();
    let init = itinera(home.path())
        .args(["init", "--api-key", "sk-test-1234567890", "--model", "alpha,beta"])
        .output()
        .unwrap();
    assert!(init.status.success(), "stderr: {}", stderr(&init));
    assert!(home.path().join("itinera").join("config.toml").exists());
    assert!(stdout(&init).contains("sk-t...7890"));

    let again = itinera(home.path()).arg("init").output().unwrap();
    assert!(!again.status.success());
    assert!(stderr(&again).contains("--force"));

    let models = itinera(home.path()).arg("models").output().unwrap();
    assert!(models.status.success(), "stderr: {}", stderr(&models));
    let out = stdout(&models);
    let alpha = out.find("alpha").unwrap();
    let beta = out.find("beta").unwrap();
    assert!(alpha < beta);
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_prints_canonical_document_and_exports() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(&well_formed_itinerary(2))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let export_path = home.path().join("kyoto.md");
    let mut cmd = itinera(home.path());
    cmd.env("ITINERA_API_KEY", "sk-test")
        .env("ITINERA_BASE_URL", server.uri())
        .args(["generate", "--destination", "Kyoto", "--days", "2"])
        .args(["--model", "gpt-5-mini", "--output"])
        .arg(&export_path);

    let output = run(cmd).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = stdout(&output);
    assert!(out.starts_with("## Day 1: Area 1\n\n"));
    assert!(out.contains("## Day 2: Area 2"));

    let export = std::fs::read_to_string(&export_path).unwrap();
    assert!(export.starts_with("# Travel Plan: Kyoto\n"));
    assert!(export.contains("Model: gpt-5-mini"));
    assert!(export.contains("Tokens: 420 prompt + 380 completion = 800 total"));
    assert!(export.ends_with(&out));
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_json_format_reports_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(&well_formed_itinerary(1))),
        )
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = itinera(home.path());
    cmd.env("ITINERA_API_KEY", "sk-test")
        .env("ITINERA_BASE_URL", server.uri())
        .args(["generate", "--destination", "Lima", "--days", "1"])
        .args(["--model", "gpt-4.1", "--format", "json"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["model"], "gpt-4.1");
    assert_eq!(value["document"]["sections"].as_array().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_fails_with_invocation_message_when_every_model_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(2)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = itinera(home.path());
    cmd.env("ITINERA_API_KEY", "sk-bad")
        .env("ITINERA_BASE_URL", server.uri())
        .args(["generate", "--destination", "Kyoto", "--days", "2"])
        .args(["--model", "m1", "--model", "m2"]);

    let output = run(cmd).await;
    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("no model produced an itinerary"), "stderr: {err}");
    assert!(err.contains("m1: authentication failed"), "stderr: {err}");
    assert!(err.contains("m2: authentication failed"), "stderr: {err}");
    assert!(err.contains("itinera self-test"), "stderr: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn generate_reports_validation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(&well_formed_itinerary(1))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = itinera(home.path());
    cmd.env("ITINERA_API_KEY", "sk-test")
        .env("ITINERA_BASE_URL", server.uri())
        .args(["generate", "--destination", "Kyoto", "--days", "3"])
        .args(["--model", "m1", "--model", "m2"]);

    let output = run(cmd).await;
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Day 2 is missing"), "stderr: {err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn self_test_pings_first_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("READY")))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let mut cmd = itinera(home.path());
    cmd.env("ITINERA_API_KEY", "sk-test")
        .env("ITINERA_BASE_URL", server.uri())
        .args(["self-test", "--model", "gpt-5-mini"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("OK: gpt-5-mini replied \"READY\""));
}
