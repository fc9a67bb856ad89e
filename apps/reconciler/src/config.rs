//! Environment-based configuration for the reconciler binary.
//!
//! Required values fail fast at startup; tuning knobs fall back to the
//! five-minute defaults.

use std::env;
use thiserror::Error;

use granta_reconciler::WorkerConfig;

/// Configuration error raised during startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required environment variable: {name}")]
    Missing { name: &'static str },

    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Full configuration for the reconciler process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string for the identity store.
    pub database_url: String,

    /// Base URL of the billing provider API.
    pub billing_api_url: String,

    /// Bearer token for the billing provider API.
    pub billing_api_token: String,

    /// Base URL of the marketplace API.
    pub marketplace_api_url: String,

    /// Bearer token for the marketplace API.
    pub marketplace_api_token: String,

    /// Per-request timeout for the external APIs, in seconds.
    pub api_timeout_secs: u64,

    /// Master switch; when off the process idles without reconciling.
    pub reconciliation_enabled: bool,

    /// Log filter directive (e.g. "info,granta=debug").
    pub log_filter: String,

    /// Worker cadence and lock settings.
    pub worker: WorkerConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let worker = WorkerConfig {
            run_interval_secs: env_u64("RECONCILIATION_FREQUENCY", 5 * 60)?,
            run_timeout_secs: env_u64("RECONCILIATION_TIMEOUT", 5 * 60)?,
            lock_padding_secs: env_u64("LOCK_TIMEOUT_PADDING", 60)?,
            include_orgs: env_bool("RECONCILIATION_INCLUDE_ORGS", true)?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            billing_api_url: required("BILLING_API_URL")?,
            billing_api_token: required("BILLING_API_TOKEN")?,
            marketplace_api_url: required("MARKETPLACE_API_URL")?,
            marketplace_api_token: required("MARKETPLACE_API_TOKEN")?,
            api_timeout_secs: env_u64("API_TIMEOUT_SECS", 30)?,
            reconciliation_enabled: env_bool("RECONCILIATION_ENABLED", true)?,
            log_filter: env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string()),
            worker,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing { name })
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value }),
        },
        Err(_) => Ok(default),
    }
}
