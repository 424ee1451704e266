//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (trace, request ID, timeout, admission, CORS, auth)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request},
    middleware,
    routing::{get, patch, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::{validate_config, ValidationError};
use crate::config::{AppConfig, CorsConfig, RescoreConfig};
use crate::http::handlers;
use crate::lifecycle::shutdown::recv_shutdown;
use crate::observability::metrics;
use crate::scoring::ScoringClient;
use crate::security::{rate_limit_middleware, require_api_key, ApiKeyGuard, SlidingWindowLimiter};
use crate::store::DataStoreClient;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: DataStoreClient,
    pub scorer: ScoringClient,
    pub rescore: RescoreConfig,
}

/// Error building the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to build upstream HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Config(Vec<ValidationError>),
}

/// HTTP server for the company scoring API.
pub struct HttpServer {
    router: Router,
    limiter: Option<Arc<SlidingWindowLimiter>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The configuration is validated again here, since callers may build
    /// an `AppConfig` without going through the loader.
    pub fn new(config: AppConfig) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ServerError::Config)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.upstream_secs))
            .build()?;

        let state = AppState {
            store: DataStoreClient::new(http.clone(), config.data_store.clone()),
            scorer: ScoringClient::new(http, config.scoring.clone()),
            rescore: config.rescore.clone(),
        };

        let limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit)));
        let guard = Arc::new(ApiKeyGuard::from_config(&config.auth));

        let router = Self::build_router(&config, state, limiter.clone(), guard);
        Ok(Self {
            router,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Outermost first: request ID, trace, timeout, admission, CORS, metrics.
    #[allow(deprecated)]
    fn build_router(
        config: &AppConfig,
        state: AppState,
        limiter: Option<Arc<SlidingWindowLimiter>>,
        guard: Arc<ApiKeyGuard>,
    ) -> Router {
        let protected = Router::new()
            .route("/score/cron", post(handlers::score_all))
            .route("/score/{company_id}", post(handlers::score_one))
            .route("/companies/{company_id}", patch(handlers::update_company_fields))
            .route_layer(middleware::from_fn_with_state(guard, require_api_key));

        let mut router = Router::new()
            .route("/health", get(handlers::health))
            .route("/companies", get(handlers::list_companies))
            .merge(protected)
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(cors_layer(&config.cors));

        if let Some(limiter) = limiter {
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rate_limit = ?self.limiter.as_ref().map(|l| (l.max_requests(), l.window())),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A handle to the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The process-wide admission limiter, if enabled.
    pub fn limiter(&self) -> Option<&Arc<SlidingWindowLimiter>> {
        self.limiter.as_ref()
    }
}

/// CORS policy.
///
/// Browsers refuse credentials with a wildcard origin, so credentials are
/// only allowed for an explicit origin list.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];

    if config.allow_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(methods)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
