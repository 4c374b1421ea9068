//! Attachment name, description, and size rules.

use percent_encoding::percent_decode_str;

use super::error::AttachmentError;

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 400;

/// Upload cap in whole mebibytes. A file reaching this size is rejected.
pub const MAX_UPLOAD_MB: u64 = 10;

/// Percent-decode a file name and check that it is usable as an object key
/// segment.
///
/// `+` is kept as is. A `%` must be followed by two hex digits and the
/// decoded bytes must be UTF-8.
///
/// # Errors
///
/// Returns [`AttachmentError::InvalidName`] when decoding fails or the
/// decoded name is empty, `.`/`..`, or contains a path separator or a
/// control character.
pub fn normalize_name(raw: &str) -> Result<String, AttachmentError> {
    let invalid = |reason: &str| AttachmentError::InvalidName {
        name: raw.to_string(),
        reason: reason.to_string(),
    };

    if !escapes_well_formed(raw) {
        return Err(invalid("malformed percent escape"));
    }
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| invalid("not valid UTF-8 once decoded"))?;

    if decoded.is_empty() {
        return Err(invalid("empty name"));
    }
    if decoded == "." || decoded == ".." {
        return Err(invalid("reserved name"));
    }
    if decoded.contains(['/', '\\']) {
        return Err(invalid("path separator"));
    }
    if decoded.chars().any(char::is_control) {
        return Err(invalid("control character"));
    }

    Ok(decoded.into_owned())
}

fn escapes_well_formed(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Check a new description.
///
/// # Errors
///
/// Returns [`AttachmentError::EmptyDescription`] for blank text and
/// [`AttachmentError::DescriptionTooLong`] above [`MAX_DESCRIPTION_CHARS`].
pub fn check_description(text: &str) -> Result<(), AttachmentError> {
    if text.trim().is_empty() {
        return Err(AttachmentError::EmptyDescription);
    }
    let chars = text.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(AttachmentError::DescriptionTooLong {
            chars,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(())
}

/// Check a declared upload size against the cap.
///
/// The size is truncated to whole mebibytes first, so the cap is reached at
/// exactly `10 * 1024 * 1024` bytes.
///
/// # Errors
///
/// Returns [`AttachmentError::PayloadTooLarge`] when the cap is reached.
pub fn check_upload_size(size: u64) -> Result<(), AttachmentError> {
    if size / 1024 / 1024 >= MAX_UPLOAD_MB {
        return Err(AttachmentError::PayloadTooLarge {
            size,
            max_mb: MAX_UPLOAD_MB,
        });
    }
    Ok(())
}
