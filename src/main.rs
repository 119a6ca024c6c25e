//! Chat Relay - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the chat API.

use chat_relay::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; a local .env fills in variables the shell did not set
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    info!(
        model = %config.model,
        max_tool_rounds = config.max_tool_rounds,
        "Loaded configuration"
    );

    api::serve(config).await?;

    Ok(())
}
