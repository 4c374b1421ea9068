//! Property-based tests for attachment validation rules.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use proptest::prelude::*;

use super::error::AttachmentError;
use super::validation::{
    MAX_DESCRIPTION_CHARS, MAX_UPLOAD_MB, check_description, check_upload_size, normalize_name,
};

const CAP_BYTES: u64 = MAX_UPLOAD_MB * 1024 * 1024;

/// File names without separators or control characters.
fn plain_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _().+-]{1,40}(\\.[a-z]{1,4})?"
        .prop_filter("reserved names", |s| s != "." && s != "..")
}

/// Non-blank text of `len` characters, mixing ASCII and multi-byte chars.
fn text_of_len(len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('a'), Just('é'), Just('界'), Just(' ')], len)
        .prop_map(move |mut chars| {
            chars[0] = 'x';
            chars.into_iter().collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Encoding a name and normalizing it gives the name back.
    #[test]
    fn prop_encoded_name_decodes_to_itself(name in plain_name()) {
        let encoded = utf8_percent_encode(&name, NON_ALPHANUMERIC).to_string();
        prop_assert_eq!(normalize_name(&encoded).unwrap(), name);
    }

    /// A name that is already decoded and free of `%` is returned unchanged.
    #[test]
    fn prop_plain_name_is_fixed_point(name in plain_name()) {
        prop_assert_eq!(normalize_name(&name).unwrap(), name);
    }

    /// Any name with a separator is rejected, encoded or not.
    #[test]
    fn prop_separator_rejected(left in plain_name(), right in plain_name(), encode in any::<bool>()) {
        let raw = if encode {
            format!("{left}%2F{right}")
        } else {
            format!("{left}/{right}")
        };
        let rejected = matches!(normalize_name(&raw), Err(AttachmentError::InvalidName { .. }));
        prop_assert!(rejected);
    }

    /// Descriptions up to the limit pass, longer ones fail.
    #[test]
    fn prop_description_length(
        (len, text) in (1usize..=MAX_DESCRIPTION_CHARS + 50)
            .prop_flat_map(|len| (Just(len), text_of_len(len)))
    ) {
        let result = check_description(&text);
        if len <= MAX_DESCRIPTION_CHARS {
            prop_assert!(result.is_ok());
        } else {
            let too_long = matches!(result, Err(AttachmentError::DescriptionTooLong { .. }));
            prop_assert!(too_long);
        }
    }

    /// Whitespace-only descriptions count as empty.
    #[test]
    fn prop_blank_description_empty(text in "[ \t\n]{0,20}") {
        let empty = matches!(check_description(&text), Err(AttachmentError::EmptyDescription));
        prop_assert!(empty);
    }

    /// Sizes below the cap pass, sizes at or above it fail.
    #[test]
    fn prop_size_cap(size in 0u64..4 * CAP_BYTES) {
        prop_assert_eq!(check_upload_size(size).is_ok(), size < CAP_BYTES);
    }
}
