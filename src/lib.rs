//! Company scoring API library.
//!
//! Lists, scores and updates company records. Records live in a PostgREST
//! data store; scores come from a chat-completions model. Every request
//! passes a global sliding-window admission check first.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod scoring;
pub mod security;
pub mod store;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
