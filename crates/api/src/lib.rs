//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Owner routes: create, login, get, list
//! - Attachment routes: upload, describe, download, delete, list
//! - Health and outbound-metrics endpoints
//! - The shared `{message, recommendedActions, errorCode}` error body

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use coffer_core::attachment::AttachmentService;
use coffer_core::outbound::OutboundMetrics;
use coffer_core::owner::{RecordService, RecordStore};
use coffer_core::storage::ObjectStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Request body ceiling: one mebibyte above the attachment cap, so that an
/// oversized file still reaches the size check in the attachment service.
pub const UPLOAD_BODY_LIMIT: usize = 11 * 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Owner record operations.
    pub records: Arc<RecordService>,
    /// Attachment lifecycle operations.
    pub attachments: Arc<AttachmentService>,
    /// Outbound call counters, exposed at `/metrics`.
    pub metrics: Arc<OutboundMetrics>,
}

impl AppState {
    /// Build the services over the given stores.
    #[must_use]
    pub fn new(
        record_store: Arc<dyn RecordStore>,
        object_store: Arc<dyn ObjectStore>,
        metrics: Arc<OutboundMetrics>,
    ) -> Self {
        let records = Arc::new(RecordService::new(record_store));
        let attachments = Arc::new(AttachmentService::new(records.clone(), object_store));
        Self {
            records,
            attachments,
            metrics,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::metrics::routes())
        .nest("/v1", routes::api_routes())
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
