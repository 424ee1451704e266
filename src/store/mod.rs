//! Company record store.
//!
//! # Data Flow
//! ```text
//! handler
//!     → client.rs (PostgREST request: filters, ordering, Range paging)
//!     → remote table
//!     → types.rs (Company rows deserialized)
//! ```
//!
//! # Design Decisions
//! - The service role key is sent on every request; it never leaves the server
//! - Missing URL or key is reported per call, so the API still starts
//! - Updates ask for `return=representation` and treat zero rows as not found

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::DataStoreClient;
pub use types::{Company, CompanyUpdate, ListParams, ListQuery, SortOrder};

/// Errors from the data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required setting (URL or key) is absent.
    #[error("{0} environment variable not set")]
    NotConfigured(&'static str),

    /// Transport failure or undecodable body.
    #[error("Data store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Data store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No row with the given id.
    #[error("Company with ID {0} not found")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
