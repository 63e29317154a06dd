use axum::{routing::get, Json, Router};
use core_config::tracing::{init_tracing, install_color_eyre};
use std::sync::Arc;
use tracing::info;

mod config;
mod openapi;

use config::Config;
use domain_users::{
    handlers, Argon2Hasher, InMemoryTokenRepository, InMemoryUserRepository, UserService,
};
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing with ErrorLayer for span trace capture
    init_tracing(&config.environment);

    let service = Arc::new(UserService::with_parts(
        Arc::new(InMemoryUserRepository::new()),
        Arc::new(InMemoryTokenRepository::new()),
        Arc::new(Argon2Hasher),
        config.bulk.clone(),
    ));

    let app = Router::new()
        .nest("/api/users", handlers::users_router(Arc::clone(&service)))
        .nest("/api/auth", handlers::auth_router(service))
        .route("/health", get(health))
        .route("/api-docs/openapi.json", get(openapi_spec));

    let address = config.server.address();
    info!(%address, "Starting user API");

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("User API shutdown complete");
    Ok(())
}

/// Liveness check with app name/version
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn openapi_spec() -> Json<serde_json::Value> {
    Json(serde_json::json!(openapi::ApiDoc::openapi()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
