//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `GHBACKUP_CONFIG`
//! environment variable. A missing file is not an error: every field has a default, so a
//! deployment can be configured from the environment alone.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `GHBACKUP_` override YAML values
//! 3. **GITHUB_TOKEN** - Special case: overrides `github.token` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `GHBACKUP_GITHUB__OWNER=octocat` sets the `github.owner` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Target repository
//! GHBACKUP_GITHUB__OWNER=octocat
//! GHBACKUP_GITHUB__REPO=study-data
//!
//! # Token used for both the read and the write call
//! GITHUB_TOKEN=ghp_xxx
//!
//! # Override server port
//! GHBACKUP_PORT=8080
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "GHBACKUP_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have defaults defined in the `Default` implementation, except the target
/// repository which must be set before [`Config::validate`] passes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Target repository and API client settings
    pub github: GitHubConfig,
    /// How incoming backups are named and bounded
    pub backups: BackupsConfig,
    /// CORS settings for browser clients
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            github: GitHubConfig::default(),
            backups: BackupsConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

/// GitHub Contents API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// Base URL of the REST API. Only changed for GitHub Enterprise or tests.
    pub api_url: Url,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to commit to. The repository default branch is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Bearer token. Usually supplied through `GITHUB_TOKEN`.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Timeout applied to each outbound request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// `User-Agent` header sent to the API (GitHub rejects requests without one)
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse("https://api.github.com").expect("static URL is valid"),
            owner: String::new(),
            repo: String::new(),
            branch: None,
            token: None,
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("ghbackup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Backup naming and request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupsConfig {
    /// Directory used for generated file names when the client sends no `fileHint`
    pub default_dir: String,
    /// Maximum accepted request body, in bytes
    pub max_body_size: usize,
}

impl Default for BackupsConfig {
    fn default() -> Self {
        Self {
            default_dir: "data/sessions".to_string(),
            max_body_size: 10 * 1024 * 1024,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            max_age: None,
        }
    }
}

/// CORS origin specification.
///
/// Either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://study.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        Self::figment(args).extract()
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("GHBACKUP_").ignore(&["config"]).split("__"))
            // The conventional token variable wins over everything else
            .merge(Env::raw().only(&["GITHUB_TOKEN"]).map(|_| "github.token".into()))
    }

    /// Validate configuration values that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), Error> {
        if self.github.owner.trim().is_empty() || self.github.repo.trim().is_empty() {
            return Err(Error::Internal {
                operation: "validate config: github.owner and github.repo must both be set. \
                     Use GHBACKUP_GITHUB__OWNER and GHBACKUP_GITHUB__REPO or add them to the config file."
                    .to_string(),
            });
        }

        if self.backups.default_dir.trim_matches('/').is_empty() {
            return Err(Error::Internal {
                operation: "validate config: backups.default_dir cannot be empty".to_string(),
            });
        }

        if self.backups.max_body_size == 0 {
            return Err(Error::Internal {
                operation: "validate config: backups.max_body_size must be positive".to_string(),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "validate config: cors.allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        if self.github.token.is_none() {
            tracing::warn!("No GitHub token configured; requests to the Contents API will be unauthenticated");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
