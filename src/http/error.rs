//! API error type and its HTTP mapping.
//!
//! Every failure leaves the service as `{"detail": "..."}` with a status
//! code chosen here, so handlers only need `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::scoring::{RescoreError, ScoringError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid API key")]
    Unauthorized,

    #[error("Server misconfigured: {0}")]
    Misconfigured(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::BAD_GATEWAY,
            ApiError::Scoring(ScoringError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Scoring(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<RescoreError> for ApiError {
    fn from(e: RescoreError) -> Self {
        match e {
            RescoreError::Store(e) => ApiError::Store(e),
            RescoreError::Scoring(e) => ApiError::Scoring(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
