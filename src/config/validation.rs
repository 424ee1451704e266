//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and formats.
//! All problems are collected so a bad config reports everything at once.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in an otherwise well-formed config.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new(
            "rate_limit.max_requests",
            "must be greater than zero",
        ));
    }
    let window = config.rate_limit.window_seconds;
    if !window.is_finite() || window <= 0.0 {
        errors.push(ValidationError::new(
            "rate_limit.window_seconds",
            format!("must be a positive number of seconds, got {}", window),
        ));
    } else if Duration::try_from_secs_f64(window).is_err() {
        errors.push(ValidationError::new(
            "rate_limit.window_seconds",
            format!("{} seconds is too long for a window", window),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::new("timeouts.upstream_secs", "must be greater than zero"));
    }

    if config.cors.allow_origins.is_empty() {
        errors.push(ValidationError::new("cors.allow_origins", "must list at least one origin"));
    }

    if let Some(raw) = &config.data_store.url {
        if let Err(e) = url::Url::parse(raw) {
            errors.push(ValidationError::new(
                "data_store.url",
                format!("'{}' is not a valid URL: {}", raw, e),
            ));
        }
    }
    if config.data_store.table.trim().is_empty() {
        errors.push(ValidationError::new("data_store.table", "must not be empty"));
    }

    if let Err(e) = url::Url::parse(&config.scoring.api_base) {
        errors.push(ValidationError::new(
            "scoring.api_base",
            format!("'{}' is not a valid URL: {}", config.scoring.api_base, e),
        ));
    }
    if !(0.0..=2.0).contains(&config.scoring.temperature) {
        errors.push(ValidationError::new(
            "scoring.temperature",
            format!("must be between 0 and 2, got {}", config.scoring.temperature),
        ));
    }
    if config.scoring.max_tokens == 0 {
        errors.push(ValidationError::new("scoring.max_tokens", "must be greater than zero"));
    }

    if config.rescore.batch_size == 0 {
        errors.push(ValidationError::new("rescore.batch_size", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
