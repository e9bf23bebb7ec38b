//! Request middleware: a global request budget and token-free logging.
//!
//! `/message` takes the token in its query string, so nothing here may
//! record the full URI.

use crate::error::ApiError;
use axum::{
    extract::{Request, State},
    http,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, warn, Span};

/// Budget used when the configured limit is zero.
const DEFAULT_PER_MINUTE: NonZeroU32 = NonZeroU32::MIN.saturating_add(59);

/// One bucket shared by every client.
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Clone)]
pub struct RateLimitState {
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// A bucket refilling at `requests_per_minute`.
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(DEFAULT_PER_MINUTE);

        Self {
            global: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        }
    }

    /// Large enough that tests never hit it.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }
}

/// Answers 429 once the shared bucket is empty.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if rate_limit.global.check().is_err() {
        warn!(path = %request.uri().path(), "Request budget exhausted");
        return Err(ApiError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Logs method, path, status and latency of each request.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed = started.elapsed();

    if status.is_success() {
        debug!(%method, %path, %status, ?elapsed, "Handled request");
    } else {
        warn!(%method, %path, %status, ?elapsed, "Request not handled");
    }

    response
}

/// Span for `TraceLayer`, carrying the path but never the query.
pub fn request_span<B>(request: &http::Request<B>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}
