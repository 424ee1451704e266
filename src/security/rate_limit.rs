//! Global sliding-window rate limiting middleware.
//!
//! Every inbound request is checked against one process-wide log of recently
//! admitted timestamps. There is no per-client keying.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        self == Admission::Admitted
    }
}

/// Sliding-window log limiter.
///
/// Holds the timestamps of admitted requests (oldest first) behind a single
/// mutex. Purge, check and append happen under one guard so concurrent
/// callers can never both see room for the last slot.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    log: Mutex<VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting at most `max_requests` per `window`.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            log: Mutex::new(VecDeque::with_capacity(max_requests)),
            max_requests,
            window,
        }
    }

    /// Build from validated configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs_f64(config.window_seconds),
        )
    }

    /// Decide whether a request arriving at `now` is admitted.
    ///
    /// Entries strictly older than the window are dropped first; an entry
    /// exactly `window` old still counts. A rejection leaves the log untouched.
    /// A `now` earlier than the newest entry is treated as that entry's time,
    /// so the log stays oldest first.
    pub fn admit(&self, now: Instant) -> Admission {
        let mut log = self.lock();
        self.admit_locked(&mut log, now)
    }

    /// Admission check against the monotonic clock.
    ///
    /// The clock is read while holding the lock, so timestamps are appended
    /// in the order callers acquire it.
    pub fn check(&self) -> Admission {
        let mut log = self.lock();
        self.admit_locked(&mut log, Instant::now())
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        // A poisoned lock only means another thread panicked mid-check; the
        // deque itself is always in a consistent state.
        self.log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admit_locked(&self, log: &mut VecDeque<Instant>, now: Instant) -> Admission {
        let now = log.back().map_or(now, |&newest| now.max(newest));

        while let Some(&oldest) = log.front() {
            if now.duration_since(oldest) > self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        if log.len() >= self.max_requests {
            return Admission::Rejected;
        }

        log.push_back(now);
        Admission::Admitted
    }

    /// Number of entries currently held (expired entries included until the
    /// next check purges them).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Middleware enforcing the global admission limit before routing.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<SlidingWindowLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check() {
        Admission::Admitted => next.run(request).await,
        Admission::Rejected => {
            tracing::warn!(
                method = %request.method(),
                path = %request.uri().path(),
                max_requests = limiter.max_requests(),
                window_secs = limiter.window().as_secs_f64(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            ApiError::RateLimited.into_response()
        }
    }
}
