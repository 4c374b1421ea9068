//! Mapping between owner records and DynamoDB items.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use coffer_core::attachment::AttachmentMetadata;
use coffer_core::owner::{Credentials, OwnerRecord, Profile, RecordStoreError, fields};

/// A raw DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

const FILE_NAME: &str = "file_name";
const DESCRIPTION: &str = "description";
const CREATED_AT: &str = "created_at";
const UPDATED_AT: &str = "updated_at";

/// Encode a record as a full item, keys included.
pub fn to_item(record: &OwnerRecord) -> Item {
    let files = record
        .attachments
        .iter()
        .map(|(name, meta)| (name.clone(), AttributeValue::M(metadata_to_map(meta))))
        .collect();

    HashMap::from([
        (fields::PARTITION_KEY.to_string(), s(&record.id)),
        (fields::SORT_KEY.to_string(), s(&record.sort_key)),
        (fields::USER_ID.to_string(), s(&record.id)),
        (fields::FIRST_NAME.to_string(), s(&record.profile.first_name)),
        (fields::LAST_NAME.to_string(), s(&record.profile.last_name)),
        (
            fields::IS_ADMIN.to_string(),
            AttributeValue::Bool(record.profile.is_admin),
        ),
        (
            fields::EMAIL.to_string(),
            s(&record.credentials.email_address),
        ),
        (
            fields::PASSWORD.to_string(),
            s(&record.credentials.password_hash),
        ),
        (fields::FILES.to_string(), AttributeValue::M(files)),
    ])
}

/// Decode an item into a record.
///
/// Missing optional attributes decode to empty values; a missing or
/// mistyped key attribute is an error.
pub fn from_item(item: &Item) -> Result<OwnerRecord, RecordStoreError> {
    let attachments = match item.get(fields::FILES) {
        Some(AttributeValue::M(files)) => files
            .iter()
            .map(|(name, value)| match value {
                AttributeValue::M(meta) => Ok((name.clone(), metadata_from_map(name, meta))),
                _ => Err(RecordStoreError::Malformed(format!(
                    "attachment {name:?} is not a map"
                ))),
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?,
        Some(AttributeValue::Null(_)) | None => BTreeMap::new(),
        Some(_) => {
            return Err(RecordStoreError::Malformed(format!(
                "{} is not a map",
                fields::FILES
            )));
        }
    };

    Ok(OwnerRecord {
        id: required(item, fields::PARTITION_KEY)?,
        sort_key: required(item, fields::SORT_KEY)?,
        profile: Profile {
            first_name: optional(item, fields::FIRST_NAME),
            last_name: optional(item, fields::LAST_NAME),
            is_admin: matches!(item.get(fields::IS_ADMIN), Some(AttributeValue::Bool(true))),
        },
        credentials: Credentials {
            email_address: optional(item, fields::EMAIL),
            password_hash: optional(item, fields::PASSWORD),
        },
        attachments,
    })
}

/// Attribute value used when comparing `field` in a filter.
pub fn filter_value(field: &str, value: &str) -> AttributeValue {
    if field == fields::IS_ADMIN {
        AttributeValue::Bool(value == "true")
    } else {
        s(value)
    }
}

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn required(item: &Item, name: &str) -> Result<String, RecordStoreError> {
    match item.get(name) {
        Some(AttributeValue::S(v)) => Ok(v.clone()),
        _ => Err(RecordStoreError::Malformed(format!(
            "missing string attribute {name}"
        ))),
    }
}

fn optional(item: &Item, name: &str) -> String {
    match item.get(name) {
        Some(AttributeValue::S(v)) => v.clone(),
        _ => String::new(),
    }
}

fn metadata_to_map(meta: &AttachmentMetadata) -> Item {
    HashMap::from([
        (FILE_NAME.to_string(), s(&meta.name)),
        (DESCRIPTION.to_string(), s(&meta.description)),
        (CREATED_AT.to_string(), s(&meta.created_at)),
        (UPDATED_AT.to_string(), s(&meta.updated_at)),
    ])
}

fn metadata_from_map(key: &str, map: &Item) -> AttachmentMetadata {
    let name = optional(map, FILE_NAME);
    AttachmentMetadata {
        name: if name.is_empty() { key.to_string() } else { name },
        description: optional(map, DESCRIPTION),
        created_at: optional(map, CREATED_AT),
        updated_at: optional(map, UPDATED_AT),
    }
}
