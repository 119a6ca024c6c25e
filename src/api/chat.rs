//! Chat, liveness and health handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use super::types::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse, HomeResponse};
use super::AppState;
use crate::agent::build_prompt;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// GET / - Liveness marker.
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Chat relay with Gemini tools is live.".to_string(),
    })
}

/// GET /health - Status and version.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /chat - Relay a message through the model and its tools.
///
/// A body that is missing, not JSON, or lacks a non-empty `message` is rejected
/// before the model is contacted. Whitespace-only messages are relayed as-is.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<ChatRequest>>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload
        .and_then(|Json(request)| request.message)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "No message provided"))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id);
    let prompt = build_prompt(&state.config.persona, &message);

    match state.agent.run(prompt).instrument(span).await {
        Ok(outcome) => {
            tracing::info!(%request_id, tool_rounds = outcome.tool_rounds, "Chat completed");
            Ok(Json(ChatResponse {
                response: outcome.response,
            }))
        }
        Err(e) => {
            tracing::error!(%request_id, error = %e, "Error during chat processing");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
