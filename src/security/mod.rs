//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (global sliding-window admission, 429 on reject)
//!     → routing
//!     → auth.rs (x-api-key check on protected routes, 401/500 on failure)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Admission runs before anything else, so rejected requests cost nothing
//! - Fail closed: protected routes refuse service when no key is configured

pub mod auth;
pub mod rate_limit;

pub use auth::{require_api_key, ApiKeyGuard, API_KEY_HEADER};
pub use rate_limit::{rate_limit_middleware, Admission, SlidingWindowLimiter};
