//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use scoping_core::completion_worker::WorkerConfig;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub completion_model: String,
    pub completion_temperature: f32,
    pub firebase_api_key: String,
    pub identity_toolkit_url: String,
    pub workers: WorkerConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| lookup(name).ok_or_else(|| ConfigError::MissingVar(name.to_string()));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &or_default("BIND_ADDRESS", "0.0.0.0:8080"))?;
        let database_url = required("DATABASE_URL")?;
        let log_level = parse_log_level(lookup("LOG_LEVEL").as_deref());

        // --- Completion Service ---
        let openai_api_key = required("OPENAI_API_KEY")?;
        let openai_api_base = or_default("OPENAI_API_BASE", "https://api.openai.com/v1");
        let completion_model = or_default("COMPLETION_MODEL", "gpt-4");
        let completion_temperature = parse_var(
            "COMPLETION_TEMPERATURE",
            &or_default("COMPLETION_TEMPERATURE", "1.0"),
        )?;

        // --- Identity Tokens ---
        let firebase_api_key = required("FIREBASE_API_KEY")?;
        let identity_toolkit_url = or_default(
            "IDENTITY_TOOLKIT_URL",
            "https://identitytoolkit.googleapis.com/v1",
        );

        // --- Completion Worker Pool ---
        let mut workers = WorkerConfig::default();
        if let Some(raw) = lookup("COMPLETION_WORKERS") {
            workers.workers = parse_positive("COMPLETION_WORKERS", &raw)?;
        }
        if let Some(raw) = lookup("COMPLETION_QUEUE_CAPACITY") {
            workers.queue_capacity = parse_positive("COMPLETION_QUEUE_CAPACITY", &raw)?;
        }
        if let Some(raw) = lookup("COMPLETION_MAX_ATTEMPTS") {
            workers.max_attempts = parse_positive("COMPLETION_MAX_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = lookup("COMPLETION_TIMEOUT_SECS") {
            workers.request_timeout =
                Duration::from_secs(parse_positive("COMPLETION_TIMEOUT_SECS", &raw)?);
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            openai_api_base,
            completion_model,
            completion_temperature,
            firebase_api_key,
            identity_toolkit_url,
            workers,
        })
    }
}

/// `trace`, `debug`, `info` and `warn` select that level; anything else,
/// including an unset variable, means `error`.
pub fn parse_log_level(raw: Option<&str>) -> Level {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") => Level::WARN,
        _ => Level::ERROR,
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialOrd,
    T::Err: std::fmt::Display,
{
    let value: T = parse_var(name, raw)?;
    if value <= T::default() {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{raw}' must be greater than zero"),
        ));
    }
    Ok(value)
}
