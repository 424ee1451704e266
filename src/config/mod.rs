//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to HttpServer, which builds every subsystem from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Secrets (API keys, service keys) come from environment variables

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{layered, load_config_with, ConfigError};
pub use schema::AppConfig;
pub use schema::{
    AuthConfig, CorsConfig, DataStoreConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RateLimitConfig, RescoreConfig, ScoringConfig, TimeoutConfig,
};
