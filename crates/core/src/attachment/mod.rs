//! Attachment lifecycle across the object store and owner records.
//!
//! This module provides:
//! - File name normalization and description/size rules
//! - Upload (blob first, then metadata)
//! - Description updates
//! - Signed download links
//! - Batch deletion (blob first, then metadata)

mod error;
mod service;
mod types;
mod validation;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod validation_props;

pub use error::AttachmentError;
pub use service::{AttachmentService, DOWNLOAD_LINK_TTL};
pub use types::{AttachmentMetadata, SignedDownload, UploadInput, timestamp_now};
pub use validation::{
    MAX_DESCRIPTION_CHARS, MAX_UPLOAD_MB, check_description, check_upload_size, normalize_name,
};
