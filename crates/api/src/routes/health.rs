//! Health check endpoint.

use axum::{Router, routing::get};

use crate::AppState;

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/healthz", get(health_check))
}
