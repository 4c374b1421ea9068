//! Object storage for attachment content using Apache OpenDAL.
//!
//! Supported providers:
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO
//! - Local filesystem (development only)
//! - In-memory (development and tests)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                   ObjectStore (trait)                    │
//! │   put(key, bytes)   delete(key)   sign(key, ttl)         │
//! ├──────────────────────────────────────────────────────────┤
//! │           StorageService (OpenDAL Operator)              │
//! │   op.write          op.delete     op.presign_read        │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod service;

pub use config::StorageProvider;
pub use error::StorageError;
pub use service::{ObjectStore, PresignedUrl, StorageService, object_key};
