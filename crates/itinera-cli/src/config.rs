//! Configuration file management for itinera.
//!
//! Provides a TOML-based config file at `~/.config/itinera/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use itinera_core::{ModelCandidate, OpenAiClient, PipelineConfig};

/// Env var holding the API key. Checked before [`FALLBACK_API_KEY_ENV`].
pub const API_KEY_ENV: &str = "ITINERA_API_KEY";
/// The conventional OpenAI variable, honored when [`API_KEY_ENV`] is unset.
pub const FALLBACK_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "ITINERA_BASE_URL";
pub const MODELS_ENV: &str = "ITINERA_MODELS";
pub const TIMEOUT_ENV: &str = "ITINERA_TIMEOUT_SECS";

/// Backend used when the config file does not name one.
pub const DEFAULT_BACKEND: &str = "openai";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub generation: GenerationSection,
    /// Candidate models in fallback order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<ModelCandidate>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiSection {
    /// Registered client name (currently only "openai").
    pub backend: Option<String>,
    pub key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Per-attempt timeout in seconds.
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the itinera config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/itinera` or `~/.config/itinera`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("itinera");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("itinera")
}

/// Return the path to the itinera config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values supplied on the command line. Empty / `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub models: Vec<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct ItineraConfig {
    pub backend: String,
    /// `None` until a key is found; commands that call the service use
    /// [`ItineraConfig::require_api_key`].
    pub api_key: Option<String>,
    pub base_url: String,
    pub pipeline: PipelineConfig,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ItineraConfig {
    /// Resolve configuration, reading the config file if one exists.
    ///
    /// A missing file means defaults; a file that cannot be read or parsed
    /// is an error.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };
        Self::resolve_with(cli, file_config.as_ref())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `ITINERA_API_KEY` env > `OPENAI_API_KEY` env > `api.key`
    /// - Base URL: `--base-url` > `ITINERA_BASE_URL` env > `api.base_url` > OpenAI
    /// - Models: `--model` (repeatable) > `ITINERA_MODELS` env > `[[models]]` > built-in list
    /// - Timeout: `--timeout` > `ITINERA_TIMEOUT_SECS` env > `generation.timeout_secs` > 120 s
    pub fn resolve_with(cli: &CliOverrides, file: Option<&ConfigFile>) -> Result<Self> {
        let api = file.map(|f| &f.api);

        let api_key = env_var(API_KEY_ENV)
            .or_else(|| env_var(FALLBACK_API_KEY_ENV))
            .or_else(|| api.and_then(|a| a.key.clone()));

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| env_var(BASE_URL_ENV))
            .or_else(|| api.and_then(|a| a.base_url.clone()))
            .unwrap_or_else(|| OpenAiClient::DEFAULT_BASE_URL.to_string());

        let backend = api
            .and_then(|a| a.backend.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND.to_string());

        let candidates = if !cli.models.is_empty() {
            ModelCandidate::parse_list(&cli.models.join(","))
        } else if let Some(models) = env_var(MODELS_ENV) {
            ModelCandidate::parse_list(&models)
        } else if let Some(f) = file.filter(|f| !f.models.is_empty()) {
            f.models.clone()
        } else {
            ModelCandidate::default_list()
        };
        if candidates.is_empty() {
            bail!("no candidate models configured; pass --model or set {MODELS_ENV}");
        }

        let timeout_secs = match cli.timeout_secs {
            Some(secs) => Some(secs),
            None => match env_var(TIMEOUT_ENV) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{TIMEOUT_ENV} is not a whole number of seconds: {raw:?}"))?,
                ),
                None => file.and_then(|f| f.generation.timeout_secs),
            },
        };
        if timeout_secs == Some(0) {
            bail!("attempt timeout must be at least one second");
        }

        let mut pipeline = PipelineConfig::with_candidates(candidates);
        if let Some(secs) = timeout_secs {
            pipeline.attempt_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            backend,
            api_key,
            base_url,
            pipeline,
        })
    }

    /// The API key, or an error explaining where to put one.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!(
                "API key not found; set {API_KEY_ENV} (or {FALLBACK_API_KEY_ENV}) or run `itinera init --api-key <KEY>`"
            ),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
