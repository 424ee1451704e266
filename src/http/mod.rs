//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout)
//!     → security::rate_limit (global admission, 429 on reject)
//!     → server.rs (CORS, routing)
//!     → security::auth (protected routes only)
//!     → handlers.rs (store / scoring calls)
//!     → error.rs (failures as {"detail": ...})
//! ```

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{AppState, HttpServer, ServerError, X_REQUEST_ID};
