//! HTTP service for the support chat widget.
//!
//! Serves the chat, login and feedback endpoints plus a token-guarded admin
//! log viewer, all backed by the conversation store.

mod config;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use chat_core::CannedCompletion;
use database::Database;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting chat web server");

    // Pick a backend; only an unusable embedded store is fatal
    let db = Database::connect(&config.store).await?;
    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN not set, admin log routes are disabled");
    }

    // Build application state
    let state = AppState::new(
        db.clone(),
        Arc::new(CannedCompletion::default()),
        config.authorized_emails,
        config.admin_token,
        config.action_links,
    );

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Chat web server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.close().await;
    info!("Chat web server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
