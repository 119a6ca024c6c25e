//! HTTP API.
//!
//! ## Endpoints
//!
//! - `GET /` - Liveness marker
//! - `GET /health` - Status and version
//! - `POST /chat` - Relay a message to the model and return its answer

mod chat;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::agent::Agent;
use crate::config::Config;
use crate::llm::GeminiClient;
use crate::tools::{declarations, ToolRegistry};

pub use chat::{chat, health, home};

/// Shared, read-only state built once at startup.
pub struct AppState {
    pub config: Config,
    pub agent: Agent,
}

impl AppState {
    /// Wire the Gemini client and tool registry from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let llm = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.model.clone(),
            config.gemini_base_url.clone(),
        ));
        let tools = Arc::new(ToolRegistry::new(config.tools.clone())?);
        let agent = Agent::new(llm, tools, declarations(), config.max_tool_rounds);
        Ok(Self { config, agent })
    }
}

/// Build the router with CORS and request tracing.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config)?);
    let app = routes(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "HTTP API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
