//! HTTP request handlers.

use super::types::{HealthResponse, SendMessageRequest, SendMessageResponse};
use super::AppState;
use crate::error::ApiError;
use axum::{
    extract::{Query, State},
    Json,
};
use kuri_registry::{codec, Delivery};
use tracing::{debug, warn};

/// Greeting at the API root.
pub async fn root() -> String {
    crate::greeting()
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        registry_count: state.registry.count(),
        dirty: state.registry.is_dirty(),
    })
}

/// `GET /message?token=..&message=..`
pub async fn send_message_query(
    State(state): State<AppState>,
    Query(request): Query<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    deliver(&state, request).await
}

/// `POST /message` with a JSON body.
pub async fn send_message_json(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    deliver(&state, request).await
}

async fn deliver(
    state: &AppState,
    request: SendMessageRequest,
) -> Result<Json<SendMessageResponse>, ApiError> {
    if request.token.is_empty() {
        return Err(ApiError::InvalidArgument("token must not be empty"));
    }
    if request.message.is_empty() {
        return Err(ApiError::InvalidArgument("message must not be empty"));
    }
    if request.message.chars().count() > state.max_message_length {
        return Err(ApiError::MessageTooLong {
            max: state.max_message_length,
        });
    }

    // The bot only issues base64url tokens
    if codec::decode(&request.token).is_err() {
        debug!("Rejecting malformed token");
        return Ok(Json(SendMessageResponse { success: false }));
    }

    let success = match state.dispatcher.notify(&request.token, &request.message).await {
        Ok(Delivery::Sent) => true,
        Ok(Delivery::UnknownToken) => false,
        Err(e) => {
            warn!("Delivery failed: {}", e);
            false
        }
    };

    Ok(Json(SendMessageResponse { success }))
}
