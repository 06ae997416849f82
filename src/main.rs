//! support-rag-chat - Retrieval-augmented IT helpdesk chat service
//!
//! Embeds the query, retrieves nearest support tickets from LanceDB,
//! extracts a password-policy context snippet, and asks the LLM for a
//! grounded answer.

mod api;
mod config;
mod engine;

use anyhow::Context;
use tracing::{error, info};

use api::AppState;
use config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                .add_directive("lance::file_audit=warn".parse().unwrap()),
        )
        .init();

    let config = ServiceConfig::from_env();
    info!(
        "Starting support-rag-chat v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.bind_addr()
    );

    let addr = config.bind_addr();
    let debug = config.debug;
    let state = AppState::new(config);

    // Warmup models on startup; in debug mode they load on first request instead
    if !debug {
        if let Err(e) = state.warmup().await {
            error!("Failed to warmup models: {}", e);
        }
    }

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install ctrl-c handler: {}", e);
        return;
    }
    info!("Shutdown signal received, draining requests");
}
