mod config;
mod diag_cmds;
mod export;
mod generate_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};

use itinera_core::ModelCandidate;

use config::{CliOverrides, ItineraConfig};
use export::OutputFormat;
use generate_cmd::TripArgs;

#[derive(Parser)]
#[command(name = "itinera", about = "Day-by-day travel itineraries from a language model")]
struct Cli {
    /// API base URL (overrides ITINERA_BASE_URL env var)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Candidate model, tried in the order given (repeatable; overrides ITINERA_MODELS)
    #[arg(long = "model", global = true)]
    models: Vec<String>,

    /// Per-attempt timeout in seconds (overrides ITINERA_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            base_url: self.base_url.clone(),
            models: self.models.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write an itinera config file
    Init {
        /// API key to store (otherwise read from ITINERA_API_KEY / OPENAI_API_KEY at run time)
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate an itinerary
    Generate {
        #[command(flatten)]
        trip: TripArgs,
        /// Output format for stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        /// Also write a Markdown export to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the prompt that would be sent, without contacting the service
    Prompt {
        #[command(flatten)]
        trip: TripArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check the API key and model access with a tiny request
    SelfTest,
    /// List the candidate models in fallback order
    Models,
}

/// Execute the `itinera init` command: write config file.
fn cmd_init(cli: &Cli, api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let models = if cli.models.is_empty() {
        ModelCandidate::default_list()
    } else {
        ModelCandidate::parse_list(&cli.models.join(","))
    };

    let cfg = config::ConfigFile {
        api: config::ApiSection {
            backend: Some(config::DEFAULT_BACKEND.to_string()),
            key: api_key.map(str::to_string),
            base_url: cli.base_url.clone(),
        },
        generation: config::GenerationSection {
            timeout_secs: cli.timeout,
        },
        models,
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    match api_key {
        Some(key) => println!("  api.key = {}", mask_key(key)),
        None => println!(
            "  api.key not set; export {} before generating",
            config::API_KEY_ENV
        ),
    }
    let ids: Vec<&str> = cfg.models.iter().map(|m| m.identifier.as_str()).collect();
    println!("  models = {}", ids.join(", "));
    println!();
    println!("Next: run `itinera self-test` to check access.");

    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { api_key, force } => {
            cmd_init(&cli, api_key.as_deref(), *force)?;
        }
        Commands::Generate {
            trip,
            format,
            output,
        } => {
            let resolved = ItineraConfig::resolve(&cli.overrides())?;
            let output = generate_cmd::output_path(output.clone())?;
            generate_cmd::run_generate(&resolved, trip, *format, output.as_deref()).await?;
        }
        Commands::Prompt { trip, json } => {
            generate_cmd::run_prompt(trip, *json)?;
        }
        Commands::SelfTest => {
            let resolved = ItineraConfig::resolve(&cli.overrides())?;
            diag_cmds::run_self_test(&resolved).await?;
        }
        Commands::Models => {
            let resolved = ItineraConfig::resolve(&cli.overrides())?;
            diag_cmds::run_models(&resolved);
        }
    }

    Ok(())
}
