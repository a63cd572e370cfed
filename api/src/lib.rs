use std::sync::Arc;

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{Router, middleware, routing::post};
use tokio::signal;
use tracing::{error, info};

pub use crate::error_handler::{AppError, AppResult};

use crate::{
    core::app_state::{AppConfig, AppState},
    middleware_layer::json_extractor::json_error_mapper,
    routes::decorate_mr::decorate_mr_route::decorate_mr_route,
};

/// Boots the HTTP server and serves until Ctrl+C.
pub async fn start() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let address = config.api_address.clone();
    let state = Arc::new(AppState { config });

    let app = Router::new()
        .route("/decorate/gitlab/mr", post(decorate_mr_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(%address, "decoration API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
