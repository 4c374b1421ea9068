//! Coffer API Server
//!
//! Main entry point for the owner and attachment service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffer_api::{AppState, create_router};
use coffer_core::outbound::{OutboundGuard, OutboundMetrics};
use coffer_core::storage::{StorageProvider, StorageService};
use coffer_db::connect;
use coffer_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coffer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    let metrics = Arc::new(OutboundMetrics::new());
    let timeout = Duration::from_secs(config.outbound.timeout_secs);

    // Record store
    let records = connect(
        &config.record_store,
        OutboundGuard::new("record_store", timeout, metrics.clone()),
    )
    .await;

    // Object store
    let provider = StorageProvider::from(config.storage);
    info!(
        provider = provider.name(),
        bucket = provider.bucket(),
        "Object storage configured"
    );
    let objects = StorageService::new(
        &provider,
        OutboundGuard::new("object_store", timeout, metrics.clone()),
    )
    .context("failed to initialize object storage")?;

    // Create application state
    let state = AppState::new(records, Arc::new(objects), metrics);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
