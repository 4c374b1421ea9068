//! Storage service implementation using Apache OpenDAL.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};

use super::config::StorageProvider;
use super::error::StorageError;
use crate::outbound::{OutboundFailure, OutboundGuard};

/// Presigned GET URL for a download.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
}

/// Blob storage as seen by the attachment service.
///
/// Implementations are bound to one bucket. Keys are opaque strings.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `content` under `key`, replacing any existing object.
    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError>;

    /// Remove the object under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Issue a time-limited read URL for `key`.
    async fn sign(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError>;
}

/// Object key of an attachment: `{owner_id}/{name}`.
#[must_use]
pub fn object_key(owner_id: &str, name: &str) -> String {
    format!("{owner_id}/{name}")
}

/// OpenDAL-backed [`ObjectStore`].
pub struct StorageService {
    operator: Operator,
    guard: OutboundGuard,
}

impl StorageService {
    /// Create a new storage service for `provider`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn new(provider: &StorageProvider, guard: OutboundGuard) -> Result<Self, StorageError> {
        let operator = Self::create_operator(provider)?;
        Ok(Self { operator, guard })
    }

    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        let operator = match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::LocalFs { root } => {
                let root = root
                    .to_str()
                    .ok_or_else(|| StorageError::configuration("invalid path"))?;
                Operator::new(services::Fs::default().root(root))
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };

        Ok(operator)
    }
}

fn flatten(failure: OutboundFailure<opendal::Error>) -> StorageError {
    match failure {
        OutboundFailure::Timeout(after) => StorageError::Timeout(after),
        OutboundFailure::Failed(err) => StorageError::from(err),
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        self.guard
            .call("put", key, self.operator.write(key, content))
            .await
            .map(|_| ())
            .map_err(flatten)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.guard
            .call("delete", key, self.operator.delete(key))
            .await
            .map_err(flatten)
    }

    async fn sign(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        let presigned = self
            .guard
            .call("sign", key, self.operator.presign_read(key, ttl))
            .await
            .map_err(flatten)?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
        })
    }
}
