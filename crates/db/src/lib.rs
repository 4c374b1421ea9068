//! Record store adapters.
//!
//! This crate provides:
//! - A DynamoDB-backed [`RecordStore`] for deployments
//! - An in-memory [`RecordStore`] for development and tests

pub mod dynamo;
pub mod memory;

use std::sync::Arc;

use coffer_core::outbound::OutboundGuard;
use coffer_core::owner::RecordStore;
use coffer_shared::config::{RecordBackend, RecordStoreConfig};
use tracing::info;

pub use dynamo::DynamoRecordStore;
pub use memory::MemoryRecordStore;

/// Opens the record store selected by `config`.
///
/// Calls to DynamoDB go through `guard`; the in-memory store makes no
/// outbound calls.
pub async fn connect(config: &RecordStoreConfig, guard: OutboundGuard) -> Arc<dyn RecordStore> {
    match config.backend {
        RecordBackend::Dynamodb => {
            info!(
                table = %config.table_name,
                region = %config.region,
                endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
                "using DynamoDB record store"
            );
            Arc::new(DynamoRecordStore::new(config, guard).await)
        }
        RecordBackend::Memory => {
            info!("using in-memory record store");
            Arc::new(MemoryRecordStore::new())
        }
    }
}
