//! `itinera self-test` and `itinera models`.

use std::time::Instant;

use anyhow::{Result, bail};

use itinera_core::ping;

use crate::config::ItineraConfig;
use crate::generate_cmd::build_client;

/// Ping the first resolved candidate and report the reply.
pub async fn run_self_test(config: &ItineraConfig) -> Result<()> {
    let Some(candidate) = config.pipeline.candidates.first() else {
        bail!("no candidate models configured");
    };
    let client = build_client(config)?;

    println!(
        "Checking {} via {} ({})...",
        candidate.identifier,
        client.name(),
        config.base_url
    );

    let started = Instant::now();
    match ping(client.as_ref(), candidate, config.pipeline.attempt_timeout).await {
        Ok(reply) => {
            println!(
                "OK: {} replied {:?} in {:.1}s",
                candidate.identifier,
                reply,
                started.elapsed().as_secs_f64()
            );
            Ok(())
        }
        Err(cause) => bail!("{} self-test failed: {cause}", candidate.identifier),
    }
}

/// Print the resolved candidate list in fallback order.
pub fn run_models(config: &ItineraConfig) {
    print!("{}", format_models(config));
}

fn format_models(config: &ItineraConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<4} {:<24} {:>10}\n", "#", "MODEL", "MAX TOKENS"));
    for (i, candidate) in config.pipeline.candidates.iter().enumerate() {
        out.push_str(&format!(
            "{:<4} {:<24} {:>10}\n",
            i + 1,
            candidate.identifier,
            candidate.max_output_tokens
        ));
    }
    out.push_str(&format!(
        "\nbackend: {}  base url: {}  attempt timeout: {}s\n",
        config.backend,
        config.base_url,
        config.pipeline.attempt_timeout.as_secs()
    ));
    out
}
