//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply overrides from
/// `env` (normally the process environment, see [`layered`]) and validate.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Lookup where `overrides` (command-line flags) win over `fallback`.
///
/// Keys use the environment variable names, so flags pass through the same
/// override and validation path as the environment.
pub fn layered<'a, F>(
    overrides: &'a [(&'static str, String)],
    fallback: F,
) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key| {
        overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .or_else(|| fallback(key))
    }
}

/// Overlay deployment values and secrets from the environment.
///
/// Secrets are expected to arrive this way rather than through the file.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("API_KEY") {
        config.auth.api_key = Some(v);
    }
    if let Some(v) = get("SUPABASE_URL") {
        config.data_store.url = Some(v.trim_end_matches('/').to_string());
    }
    if let Some(v) = get("SUPABASE_KEY") {
        config.data_store.service_key = Some(v);
    }
    if let Some(v) = get("OPENAI_API_KEY") {
        config.scoring.api_key = Some(v);
    }
    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("CORS_ALLOW_ORIGINS") {
        config.cors.allow_origins = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = get("RATE_LIMIT_MAX_REQUESTS") {
        config.rate_limit.max_requests = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "RATE_LIMIT_MAX_REQUESTS",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("RATE_LIMIT_WINDOW_SECONDS") {
        config.rate_limit.window_seconds = v.trim().parse().map_err(|_| ConfigError::Env {
            var: "RATE_LIMIT_WINDOW_SECONDS",
            value: v.clone(),
        })?;
    }

    Ok(())
}
