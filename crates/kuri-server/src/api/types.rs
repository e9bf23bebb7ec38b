//! API request and response types.

use serde::{Deserialize, Serialize};

/// Notification request, from the query string or a JSON body.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Recipient's bearer token
    pub token: String,

    /// Text to deliver
    pub message: String,
}

/// Notification result.
///
/// `success` is false both for unknown tokens and for delivery failures;
/// callers cannot tell the two apart.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub registry_count: usize,
    /// Registrations not yet flushed to storage
    pub dirty: bool,
}
