//! API key verification for mutating endpoints.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::config::AuthConfig;
use crate::http::error::ApiError;

/// Header carrying the client's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Holds the expected API key, if one was configured.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyGuard {
    expected: Option<String>,
}

impl ApiKeyGuard {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.api_key.clone())
    }

    /// Check a presented key.
    ///
    /// With no key configured every request fails: the server refuses to run
    /// protected endpoints open.
    pub fn verify(&self, presented: Option<&str>) -> Result<(), ApiError> {
        let expected = self
            .expected
            .as_deref()
            .ok_or_else(|| ApiError::Misconfigured("API_KEY not set".to_string()))?;

        match presented {
            Some(key) if key == expected => Ok(()),
            _ => Err(ApiError::Unauthorized),
        }
    }
}

/// Middleware rejecting requests without a valid `x-api-key` header.
pub async fn require_api_key(
    State(guard): State<Arc<ApiKeyGuard>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if let Err(e) = guard.verify(presented) {
        tracing::debug!(path = %request.uri().path(), error = %e, "API key check failed");
        return Err(e);
    }

    Ok(next.run(request).await)
}
