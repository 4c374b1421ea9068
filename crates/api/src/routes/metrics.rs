//! Outbound call metrics endpoint.

use axum::{Json, Router, extract::State, routing::get};
use coffer_core::outbound::CallStatsSnapshot;

use crate::AppState;

/// GET `/metrics`
/// Per-(service, operation) counters of record store and object store calls.
async fn outbound_metrics(State(state): State<AppState>) -> Json<Vec<CallStatsSnapshot>> {
    Json(state.metrics.snapshot())
}

/// Creates metrics routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(outbound_metrics))
}
