//! Attachment service implementation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::error::AttachmentError;
use super::types::{AttachmentMetadata, SignedDownload, UploadInput, timestamp_now};
use super::validation::{check_description, check_upload_size, normalize_name};
use crate::owner::{OwnerRecord, RecordService};
use crate::storage::{ObjectStore, object_key};

/// Lifetime of a signed download link.
pub const DOWNLOAD_LINK_TTL: Duration = Duration::from_secs(120);

/// Keeps attachment blobs and the metadata embedded in owner records in
/// step.
///
/// There is no transaction across the two stores. Each operation orders
/// its writes so that a failure leaves at worst an orphaned blob, never
/// metadata pointing at a blob that was not written or not confirmed
/// deleted.
pub struct AttachmentService {
    records: Arc<RecordService>,
    objects: Arc<dyn ObjectStore>,
}

impl AttachmentService {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(records: Arc<RecordService>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { records, objects }
    }

    async fn load_owner(&self, owner_id: &str) -> Result<OwnerRecord, AttachmentError> {
        Ok(self.records.get_and_validate(owner_id).await?)
    }

    /// Store a file and record its metadata on the owner.
    ///
    /// The blob is written before the record. An existing attachment with
    /// the same name is overwritten, description and timestamps included.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is invalid or the file reaches the size cap
    /// - The owner does not exist
    /// - The blob write fails (record untouched)
    /// - The record write fails after the blob was written
    pub async fn upload(&self, input: UploadInput) -> Result<OwnerRecord, AttachmentError> {
        let name = normalize_name(&input.proposed_name)?;
        check_upload_size(input.size)?;
        let mut owner = self.load_owner(&input.owner_id).await?;

        let key = object_key(&owner.id, &name);
        self.objects
            .put(&key, input.content)
            .await
            .map_err(|source| {
                error!(owner_id = %owner.id, name = %name, error = %source, "blob write failed");
                AttachmentError::StorageWriteFailed {
                    name: name.clone(),
                    source,
                }
            })?;

        let now = timestamp_now();
        owner
            .attachments
            .insert(name.clone(), AttachmentMetadata::uploaded(name.clone(), &now));

        let owner = self.records.update(owner).await.map_err(|source| {
            warn!(
                owner_id = %input.owner_id,
                name = %name,
                key = %key,
                error = %source,
                "blob stored but metadata not saved"
            );
            AttachmentError::MetadataPersistFailed {
                name: name.clone(),
                source,
            }
        })?;

        info!(owner_id = %owner.id, name = %name, size = input.size, "attachment uploaded");
        Ok(owner)
    }

    /// Set the description of one or more attachments.
    ///
    /// A single-name request whose description already has the new value
    /// is rejected with [`AttachmentError::NoOpUpdate`]. Batches skip that
    /// check. Timestamps are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if any name is invalid or missing, the description
    /// is rejected, or the record cannot be saved. Nothing is written
    /// unless every name passes.
    pub async fn update_description(
        &self,
        owner_id: &str,
        names: &[String],
        description: &str,
    ) -> Result<OwnerRecord, AttachmentError> {
        if names.is_empty() {
            return Err(AttachmentError::EmptyBatch);
        }
        let names = names
            .iter()
            .map(|raw| normalize_name(raw))
            .collect::<Result<Vec<_>, _>>()?;
        check_description(description)?;

        let mut owner = self.load_owner(owner_id).await?;

        for name in &names {
            let Some(meta) = owner.attachments.get(name) else {
                return Err(AttachmentError::attachment_not_found(owner_id, name));
            };
            if names.len() == 1 && meta.description == description {
                return Err(AttachmentError::NoOpUpdate { name: name.clone() });
            }
        }
        for name in &names {
            if let Some(meta) = owner.attachments.get_mut(name) {
                meta.description = description.to_string();
            }
        }

        let owner = self.records.update(owner).await?;
        info!(owner_id = %owner.id, names = ?names, "attachment descriptions updated");
        Ok(owner)
    }

    /// Issue a short-lived download link.
    ///
    /// Existence is decided by the metadata alone; the blob is not checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner or attachment is missing or signing
    /// fails.
    pub async fn download(
        &self,
        owner_id: &str,
        name: &str,
    ) -> Result<SignedDownload, AttachmentError> {
        let owner = self.load_owner(owner_id).await?;
        if !owner.attachments.contains_key(name) {
            return Err(AttachmentError::attachment_not_found(owner_id, name));
        }

        let presigned = self
            .objects
            .sign(&object_key(&owner.id, name), DOWNLOAD_LINK_TTL)
            .await
            .map_err(|source| AttachmentError::SigningFailed {
                name: name.to_string(),
                source,
            })?;

        Ok(SignedDownload {
            presigned_url: presigned.url,
        })
    }

    /// Delete attachments one by one, blob first, then metadata.
    ///
    /// The batch stops at the first failure. Names processed before it stay
    /// deleted; the error then reports them along with the failed name.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first name that could not be deleted,
    /// wrapped in [`AttachmentError::DeleteAborted`] if earlier names were
    /// already removed.
    pub async fn delete(
        &self,
        owner_id: &str,
        names: &[String],
    ) -> Result<OwnerRecord, AttachmentError> {
        let Some((first, rest)) = names.split_first() else {
            return Err(AttachmentError::EmptyBatch);
        };

        let mut owner = self.delete_one(owner_id, first).await?;
        let mut completed = vec![first.clone()];

        for name in rest {
            match self.delete_one(owner_id, name).await {
                Ok(updated) => {
                    owner = updated;
                    completed.push(name.clone());
                }
                Err(source) => {
                    warn!(
                        owner_id,
                        failed = %name,
                        completed = ?completed,
                        error = %source,
                        "attachment batch delete aborted"
                    );
                    return Err(AttachmentError::DeleteAborted {
                        failed: name.clone(),
                        completed,
                        source: Box::new(source),
                    });
                }
            }
        }

        Ok(owner)
    }

    async fn delete_one(&self, owner_id: &str, name: &str) -> Result<OwnerRecord, AttachmentError> {
        let owner = self.load_owner(owner_id).await?;
        if !owner.attachments.contains_key(name) {
            return Err(AttachmentError::attachment_not_found(owner_id, name));
        }

        self.objects
            .delete(&object_key(&owner.id, name))
            .await
            .map_err(|source| {
                error!(owner_id, name, error = %source, "blob delete failed, metadata kept");
                AttachmentError::StorageDeleteFailed {
                    name: name.to_string(),
                    source,
                }
            })?;

        // Re-read so changes made while the blob was being deleted survive.
        let mut owner = self.load_owner(owner_id).await?;
        owner.attachments.remove(name);
        let owner = self.records.update(owner).await.map_err(|source| {
            warn!(owner_id, name, error = %source, "blob deleted but metadata not saved");
            AttachmentError::MetadataRemoveFailed {
                name: name.to_string(),
                source,
            }
        })?;

        info!(owner_id, name, "attachment deleted");
        Ok(owner)
    }
}
