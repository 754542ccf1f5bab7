/// Server setup and initialization
///
/// Wires together the wizard session, the generation client and the HTTP routes.
/// Provides the main application factory function for creating the Axum app.

use crate::{
    api::{create_crd_routes, create_generate_routes, create_session_routes, AppState},
    config::Config,
    session::Session,
    submit::Generator,
};
use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;

/// Install the fmt subscriber used by every entry point
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();
}

/// Router over an existing state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        .merge(create_session_routes())
        .merge(create_crd_routes())
        .merge(create_generate_routes())
        .with_state(state)
}

/// Create the main Axum application with all routes
///
/// Starts from a fresh session holding one empty CRD.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📁 Ensuring download directory exists: {}", config.download.dir);
    tokio::fs::create_dir_all(&config.download.dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create download directory: {}", e))?;

    tracing::info!("🔗 Generation service: {}", config.generator.api_url);
    let state = AppState::new(Session::new(), Generator::from_config(&config));

    tracing::info!("📡 Creating HTTP router with all endpoints");
    let app = create_router(state);

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
///
/// Expects tracing to be initialized by the caller.
pub async fn start_server(config: Config) -> Result<()> {
    tracing::info!("Starting OSDK wizard server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
