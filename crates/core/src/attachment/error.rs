//! Attachment error types.

use coffer_shared::AppError;
use thiserror::Error;

use crate::owner::OwnerError;
use crate::storage::StorageError;

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    // ========== Validation Errors ==========
    /// The file name cannot be decoded or is not an acceptable name.
    #[error("invalid file name {name:?}: {reason}")]
    InvalidName {
        /// Name as received.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The file reaches the upload cap.
    #[error("file of {size} bytes reaches the {max_mb} MB upload limit")]
    PayloadTooLarge {
        /// Declared size in bytes.
        size: u64,
        /// Cap in whole mebibytes.
        max_mb: u64,
    },

    /// The new description is blank.
    #[error("description must not be empty")]
    EmptyDescription,

    /// The new description is over the length limit.
    #[error("description has {chars} characters, the limit is {max}")]
    DescriptionTooLong {
        /// Character count of the description.
        chars: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// No file name was given.
    #[error("at least one file name is required")]
    EmptyBatch,

    // ========== Lookup Errors ==========
    /// The owner record does not exist.
    #[error("owner not found: {0}")]
    OwnerNotFound(String),

    /// The owner has no attachment under this name.
    #[error("owner {owner_id} has no attachment named {name:?}")]
    AttachmentNotFound {
        /// Owner id.
        owner_id: String,
        /// Requested name.
        name: String,
    },

    /// The description already has the requested value.
    #[error("description of {name:?} is already set to this value")]
    NoOpUpdate {
        /// Attachment name.
        name: String,
    },

    // ========== Store Errors ==========
    /// Writing the blob failed; the record was not touched.
    #[error("storing {name:?} failed: {source}")]
    StorageWriteFailed {
        /// Attachment name.
        name: String,
        /// Object store error.
        #[source]
        source: StorageError,
    },

    /// The blob was written but the record could not be saved.
    #[error("saving metadata for {name:?} failed: {source}")]
    MetadataPersistFailed {
        /// Attachment name.
        name: String,
        /// Record service error.
        #[source]
        source: OwnerError,
    },

    /// The blob was deleted but the record still lists it.
    #[error("removing metadata for {name:?} failed after its content was deleted: {source}")]
    MetadataRemoveFailed {
        /// Attachment name.
        name: String,
        /// Record service error.
        #[source]
        source: OwnerError,
    },

    /// The object store could not sign a download link.
    #[error("signing a download link for {name:?} failed: {source}")]
    SigningFailed {
        /// Attachment name.
        name: String,
        /// Object store error.
        #[source]
        source: StorageError,
    },

    /// Removing the blob failed; the metadata was kept.
    #[error("deleting {name:?} from storage failed: {source}")]
    StorageDeleteFailed {
        /// Attachment name.
        name: String,
        /// Object store error.
        #[source]
        source: StorageError,
    },

    /// Loading or saving the owner record failed.
    #[error(transparent)]
    Owner(OwnerError),

    /// A batch delete stopped part way.
    #[error("delete stopped at {failed:?} after removing {completed:?}: {source}")]
    DeleteAborted {
        /// Name that failed.
        failed: String,
        /// Names fully deleted before the failure.
        completed: Vec<String>,
        /// Failure of `failed`.
        #[source]
        source: Box<AttachmentError>,
    },
}

impl From<OwnerError> for AttachmentError {
    fn from(err: OwnerError) -> Self {
        match err {
            OwnerError::NotFound(id) => Self::OwnerNotFound(id),
            other => Self::Owner(other),
        }
    }
}

impl AttachmentError {
    /// Create an attachment not found error.
    #[must_use]
    pub fn attachment_not_found(owner_id: &str, name: &str) -> Self {
        Self::AttachmentNotFound {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
        }
    }

    /// True when an upstream call timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::StorageWriteFailed { source, .. }
            | Self::SigningFailed { source, .. }
            | Self::StorageDeleteFailed { source, .. } => source.is_timeout(),
            Self::MetadataPersistFailed { source, .. }
            | Self::MetadataRemoveFailed { source, .. }
            | Self::Owner(source) => source.is_timeout(),
            Self::DeleteAborted { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Remediation hints for the caller or operator.
    #[must_use]
    pub fn recommended_actions(&self) -> Vec<String> {
        match self {
            Self::InvalidName { .. } => {
                vec!["Use a file name without path separators or control characters".to_string()]
            }
            Self::PayloadTooLarge { max_mb, .. } => {
                vec![format!("Upload a file smaller than {max_mb} MB")]
            }
            Self::EmptyDescription => vec!["Provide a non-empty description".to_string()],
            Self::DescriptionTooLong { max, .. } => {
                vec![format!("Shorten the description to at most {max} characters")]
            }
            Self::EmptyBatch => vec!["Pass at least one file name".to_string()],
            Self::OwnerNotFound(_) => vec!["Check the user id".to_string()],
            Self::AttachmentNotFound { .. } => {
                vec!["List the user's files to check the name".to_string()]
            }
            Self::NoOpUpdate { .. } => {
                vec!["Send a description different from the current one".to_string()]
            }
            Self::MetadataPersistFailed { name, source } => {
                let mut actions = vec![format!(
                    "Retry the upload of {name:?}; the stored content will be overwritten"
                )];
                actions.extend(source.recommended_actions());
                actions
            }
            Self::MetadataRemoveFailed { name, source } => {
                let mut actions = vec![
                    format!("The content of {name:?} is already deleted; its metadata entry is stale"),
                    format!("Retry the delete of {name:?} to remove the entry"),
                ];
                actions.extend(source.recommended_actions());
                actions
            }
            Self::Owner(source) => source.recommended_actions(),
            Self::DeleteAborted {
                failed, completed, ..
            } => vec![
                format!("Retry the delete for {failed:?} and any names after it"),
                format!("Already deleted: {}", completed.join(", ")),
            ],
            Self::StorageWriteFailed { .. }
            | Self::SigningFailed { .. }
            | Self::StorageDeleteFailed { .. } => {
                vec!["Retry the request later or contact an administrator".to_string()]
            }
        }
    }

    fn kind(&self) -> fn(String) -> AppError {
        if self.is_timeout() {
            return AppError::Unavailable;
        }
        match self {
            Self::InvalidName { .. }
            | Self::EmptyDescription
            | Self::DescriptionTooLong { .. }
            | Self::EmptyBatch => AppError::Validation,
            Self::PayloadTooLarge { .. } => AppError::PayloadTooLarge,
            Self::OwnerNotFound(_) | Self::AttachmentNotFound { .. } => AppError::NotFound,
            Self::NoOpUpdate { .. } => AppError::Conflict,
            Self::StorageWriteFailed { .. }
            | Self::SigningFailed { .. }
            | Self::StorageDeleteFailed { .. } => AppError::ExternalService,
            Self::MetadataPersistFailed { .. } | Self::MetadataRemoveFailed { .. } => {
                AppError::Database
            }
            Self::Owner(OwnerError::Unauthorized | OwnerError::EmailNotFound(_)) => {
                AppError::Unauthorized
            }
            Self::Owner(OwnerError::AmbiguousCredentials { .. }) => AppError::Conflict,
            Self::Owner(OwnerError::Password(_)) => AppError::Internal,
            Self::Owner(_) => AppError::Database,
            Self::DeleteAborted { source, .. } => source.kind(),
        }
    }
}

impl From<AttachmentError> for AppError {
    fn from(err: AttachmentError) -> Self {
        (err.kind())(err.to_string())
    }
}
