//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod attachments;
pub mod health;
pub mod metrics;
pub mod users;

/// Creates the versioned API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(users::routes())
        .merge(attachments::routes())
}
