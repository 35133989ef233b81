//! Application builder and server entry point.

use std::sync::Arc;

use tower_http::trace::TraceLayer;

use estatehub_core::config::AppConfig;
use estatehub_core::error::{AppError, ErrorKind};
use estatehub_core::result::AppResult;
use estatehub_database::{DatabasePool, run_migrations};
use estatehub_database::repositories::{ResourceRepository, UserRepository};

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> axum::Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Connects to PostgreSQL, wires the state, and serves until Ctrl+C.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting EstateHub server...");

    let db = DatabasePool::connect(&config.database).await?;
    if !db.ping().await {
        tracing::warn!("Database did not answer the startup ping");
    }
    if config.database.run_migrations {
        run_migrations(&db.pool()).await?;
    }

    let users = Arc::new(UserRepository::new(db.pool()));
    let resources = Arc::new(ResourceRepository::new(db.pool()));
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = build_app(AppState::new(config, users, resources));

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e)
    })?;
    tracing::info!("EstateHub server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    db.close().await;
    tracing::info!("EstateHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
