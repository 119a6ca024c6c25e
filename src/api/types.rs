//! API request and response types.

use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Final answer from the model
    pub response: String,
}

/// Error payload for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Liveness marker returned by `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct HomeResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}
