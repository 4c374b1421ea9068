//! Attachment types and data structures.

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of one attachment, embedded in its owner record.
///
/// The blob itself lives in the object store under `{owner_id}/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMetadata {
    /// Normalized file name, unique within the owner record.
    #[serde(rename = "file_name")]
    pub name: String,
    /// Free text, at most 400 characters. Empty means "not set".
    pub description: String,
    /// RFC 3339 timestamp of the upload.
    pub created_at: String,
    /// RFC 3339 timestamp, equal to `created_at` until re-uploaded.
    pub updated_at: String,
}

impl AttachmentMetadata {
    /// Metadata for a freshly uploaded blob: empty description, both
    /// timestamps set to `now`.
    #[must_use]
    pub fn uploaded(name: impl Into<String>, now: &str) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }

    /// Whether a description has been set.
    #[must_use]
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Current time in the fixed textual format used for attachment timestamps.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Input for uploading an attachment.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// Owner record ID.
    pub owner_id: String,
    /// File name as received, possibly percent-encoded.
    pub proposed_name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// File content.
    pub content: Bytes,
}

/// Time-limited read link for one attachment. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedDownload {
    /// Presigned GET URL.
    #[serde(rename = "presignedURL")]
    pub presigned_url: String,
}
