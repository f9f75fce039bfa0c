//! Main entry point for the MuXue Online accounts server.
//!
//! This file initializes logging, loads configuration, sets up the database
//! (running migrations), and registers all page routes and middleware.

mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;
mod views;


use crate::views::common::AppState;
use axum::{Extension, Router, middleware};
use config::Config;
use database::Database;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = Config::from_env()?;
    let db = Database::new(&config).await?;
    db.migrate().await?;

    let state = AppState {
        pool: db.pool().clone(),
        mailer: services::email_service::mailer_from_config(&config),
        config: Arc::new(config.clone()),
    };

    purge_stale_rows(&state).await;

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Starting MuXue Online accounts server on port {}", config.server_port);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    Ok(())
}

/// Builds the application router with every page route and middleware.
fn app(state: AppState) -> Router {
    Router::new()
        .merge(views::home::home_router())
        .merge(auth::routes::auth_router())
        .merge(views::account::routes::account_router())
        .layer(middleware::from_fn(auth::middleware::session_auth))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

/// Drops expired sessions and spent or expired verification codes.
async fn purge_stale_rows(state: &AppState) {
    let auth_service = auth::service::AuthService::new(&state.pool, &state.config);
    match auth_service.purge_expired_sessions().await {
        Ok(removed) => info!("Removed {} expired sessions", removed),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
    }

    let verification_service = services::verification_service::VerificationService::new(
        &state.pool,
        &state.config,
        state.mailer.as_ref(),
    );
    match verification_service.purge_stale().await {
        Ok(removed) => info!("Removed {} stale verification codes", removed),
        Err(e) => tracing::warn!("Failed to purge verification codes: {}", e),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
