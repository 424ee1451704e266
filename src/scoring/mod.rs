//! Language-model scoring subsystem.
//!
//! # Data Flow
//! ```text
//! Company (from the store)
//!     → prompt.rs (system + user prompt)
//!     → client.rs (chat completion request)
//!     → prompt.rs (parse {"score", "reason"})
//!     → job.rs (write back, single or bulk)
//! ```

pub mod client;
pub mod job;
pub mod prompt;

use thiserror::Error;

pub use client::ScoringClient;
pub use job::{rescore_all, rescore_one, RescoreError, RescoreSummary, Rescored};
pub use prompt::Assessment;

/// Errors from the scoring provider.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Provider key is absent.
    #[error("{0} environment variable not set")]
    NotConfigured(&'static str),

    /// Transport failure.
    #[error("Scoring API call failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Scoring API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply did not contain a usable score.
    #[error("Failed to parse scoring response: {0}")]
    Parse(String),
}

pub type ScoringResult<T> = Result<T, ScoringError>;
