//! Record service error types.

use coffer_shared::AppError;
use thiserror::Error;

use super::store::RecordStoreError;
use crate::auth::PasswordError;

/// Step of a record write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Initial creation of a record.
    Create,
    /// Removal of the previous version during an update.
    Delete,
    /// Re-creation of the record during an update.
    Recreate,
}

impl std::fmt::Display for WriteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Recreate => "recreate",
        })
    }
}

/// Errors raised by the record service.
#[derive(Debug, Error)]
pub enum OwnerError {
    // ========== Lookup Errors ==========
    /// No record under this id, or the id was empty.
    #[error("owner not found: {0:?}")]
    NotFound(String),

    /// No record carries this e-mail address.
    #[error("no owner registered with e-mail {0}")]
    EmailNotFound(String),

    /// More than one record carries this e-mail address.
    #[error("{matches} owners share the e-mail {email}")]
    AmbiguousCredentials {
        /// Shared e-mail address.
        email: String,
        /// Number of matching records.
        matches: usize,
    },

    /// The supplied password does not match the stored hash.
    #[error("invalid credentials")]
    Unauthorized,

    // ========== Store Errors ==========
    /// Reading from the record store failed.
    #[error("record store read failed: {0}")]
    StoreRead(#[source] RecordStoreError),

    /// Writing to the record store failed.
    #[error("record store {step} failed for owner {id}: {source}")]
    StoreWriteFailed {
        /// Owner id being written.
        id: String,
        /// Step that failed.
        step: WriteStep,
        /// Underlying store error.
        #[source]
        source: RecordStoreError,
    },

    /// Hashing or verifying a password failed.
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl OwnerError {
    /// True when the underlying store call timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::StoreRead(source) | Self::StoreWriteFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Remediation hints for the caller or operator.
    #[must_use]
    pub fn recommended_actions(&self) -> Vec<String> {
        match self {
            Self::NotFound(_) => vec!["Check the user id".to_string()],
            Self::EmailNotFound(_) | Self::Unauthorized => {
                vec!["Check the e-mail address and password".to_string()]
            }
            Self::AmbiguousCredentials { .. } => vec![
                "Contact an administrator to resolve the duplicate e-mail address".to_string(),
            ],
            Self::StoreWriteFailed {
                step: WriteStep::Recreate,
                id,
                ..
            } => vec![
                format!("Owner {id} was removed but not re-created; restore it from the last known state"),
                "Retry the request".to_string(),
            ],
            _ if self.is_timeout() => vec!["Retry the request".to_string()],
            Self::StoreRead(_) | Self::StoreWriteFailed { .. } | Self::Password(_) => {
                vec!["Retry the request later or contact an administrator".to_string()]
            }
        }
    }
}

impl From<OwnerError> for AppError {
    fn from(err: OwnerError) -> Self {
        if err.is_timeout() {
            return Self::Unavailable(err.to_string());
        }
        match err {
            OwnerError::NotFound(_) => Self::NotFound(err.to_string()),
            OwnerError::EmailNotFound(_) | OwnerError::Unauthorized => {
                Self::Unauthorized(err.to_string())
            }
            OwnerError::AmbiguousCredentials { .. } => Self::Conflict(err.to_string()),
            OwnerError::StoreRead(_) | OwnerError::StoreWriteFailed { .. } => {
                Self::Database(err.to_string())
            }
            OwnerError::Password(_) => Self::Internal(err.to_string()),
        }
    }
}
