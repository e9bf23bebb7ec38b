//! HTTP API for token-addressed notifications.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, request_span, RateLimitState};
pub use types::*;

use axum::{body::Body, http::Method, middleware as axum_middleware, routing::get, Router};
use kuri_registry::{NotificationDispatcher, Registry};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// User registry
    pub registry: Arc<Registry>,
    /// Token to chat delivery
    pub dispatcher: NotificationDispatcher,
    /// Longest accepted message, in characters
    pub max_message_length: usize,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        dispatcher: NotificationDispatcher,
        max_message_length: usize,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            max_message_length,
        }
    }
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/message",
            get(handlers::send_message_query).post(handlers::send_message_json),
        )
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .with_state(state)
}
