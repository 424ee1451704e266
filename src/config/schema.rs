//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the company scoring API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Global admission control.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// API key protecting mutating endpoints.
    pub auth: AuthConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Company record store (PostgREST).
    pub data_store: DataStoreConfig,

    /// Language-model scoring provider.
    pub scoring: ScoringConfig,

    /// Bulk rescoring job.
    pub rescore: RescoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Sliding-window rate limiting configuration.
///
/// The limit is global: every request counts against the same window,
/// regardless of client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum admitted requests per window.
    pub max_requests: usize,

    /// Window length in seconds.
    pub window_seconds: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            window_seconds: 1.0,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time spent handling an inbound request) in seconds.
    pub request_secs: u64,

    /// Timeout for each outbound call to the data store or scoring provider.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// API key authentication.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Expected value of the `x-api-key` header. Usually supplied via `API_KEY`.
    pub api_key: Option<String>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any origin.
    pub allow_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
        }
    }
}

/// PostgREST data store connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataStoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: Option<String>,

    /// Service role key sent as `apikey` and bearer token.
    pub service_key: Option<String>,

    /// Table holding company records.
    pub table: String,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: "companies".to_string(),
        }
    }
}

/// Chat-completions scoring provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Provider base URL (without the `/v1/...` suffix).
    pub api_base: String,

    /// Bearer token for the provider.
    pub api_key: Option<String>,

    /// Model name.
    pub model: String,

    /// Completion token cap.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 200,
            temperature: 0.2,
        }
    }
}

/// Bulk rescoring job configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RescoreConfig {
    /// Companies fetched per page.
    pub batch_size: u32,
}

impl Default for RescoreConfig {
    fn default() -> Self {
        Self { batch_size: 200 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
