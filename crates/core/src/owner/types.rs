//! Owner record types.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::attachment::AttachmentMetadata;

/// Sort key shared by every owner record.
pub const OWNER_SORT_KEY: &str = "user";

/// Attribute names of an owner record in the record store.
///
/// Scan filters refer to fields by these names.
pub mod fields {
    /// Partition key, equal to the owner id.
    pub const PARTITION_KEY: &str = "PKey";
    /// Sort key, always [`super::OWNER_SORT_KEY`].
    pub const SORT_KEY: &str = "SKey";
    /// Owner id.
    pub const USER_ID: &str = "UserID";
    /// First name.
    pub const FIRST_NAME: &str = "FirstName";
    /// Last name.
    pub const LAST_NAME: &str = "LastName";
    /// Admin flag.
    pub const IS_ADMIN: &str = "IsAdmin";
    /// Login e-mail.
    pub const EMAIL: &str = "EmailAddress";
    /// Password hash.
    pub const PASSWORD: &str = "Password";
    /// Attachment mapping.
    pub const FILES: &str = "FileInfo";
}

/// Descriptive part of an owner record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    /// First name.
    pub first_name: String,
    /// Last name, may be empty.
    pub last_name: String,
    /// Whether the owner has admin rights.
    pub is_admin: bool,
}

/// Login credentials. The password is only ever held hashed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login e-mail.
    pub email_address: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email_address", &self.email_address)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// A user record together with its embedded attachment metadata.
///
/// Every mutation replaces the whole record in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRecord {
    /// Opaque unique id, also the partition key.
    pub id: String,
    /// Sort key, [`OWNER_SORT_KEY`] for owner records.
    pub sort_key: String,
    /// Name and admin flag.
    pub profile: Profile,
    /// Login credentials.
    pub credentials: Credentials,
    /// Attachment name to metadata. Empty is valid.
    pub attachments: BTreeMap<String, AttachmentMetadata>,
}

impl OwnerRecord {
    /// New record with a generated id and no attachments.
    #[must_use]
    pub fn new(profile: Profile, credentials: Credentials) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sort_key: OWNER_SORT_KEY.to_string(),
            profile,
            credentials,
            attachments: BTreeMap::new(),
        }
    }

    /// Scalar value of a named field, as compared by scan filters.
    ///
    /// Returns `None` for unknown fields and for the attachment mapping.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            fields::PARTITION_KEY | fields::USER_ID => Some(self.id.clone()),
            fields::SORT_KEY => Some(self.sort_key.clone()),
            fields::FIRST_NAME => Some(self.profile.first_name.clone()),
            fields::LAST_NAME => Some(self.profile.last_name.clone()),
            fields::IS_ADMIN => Some(self.profile.is_admin.to_string()),
            fields::EMAIL => Some(self.credentials.email_address.clone()),
            fields::PASSWORD => Some(self.credentials.password_hash.clone()),
            _ => None,
        }
    }

    /// The record as shown to API callers, without the password hash.
    #[must_use]
    pub fn public_view(&self) -> PublicProfile {
        PublicProfile {
            user_id: self.id.clone(),
            first_name: self.profile.first_name.clone(),
            last_name: self.profile.last_name.clone(),
            is_admin: self.profile.is_admin,
            email_address: self.credentials.email_address.clone(),
            files: self.attachments.clone(),
        }
    }
}

/// Externally visible owner profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    /// Owner id.
    #[serde(rename = "userID")]
    pub user_id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    /// Admin flag.
    pub is_admin: bool,
    /// Login e-mail.
    pub email_address: String,
    /// Attachments by name.
    pub files: BTreeMap<String, AttachmentMetadata>,
}

/// Input for registering a new owner.
#[derive(Debug, Clone)]
pub struct NewOwner {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Login e-mail.
    pub email_address: String,
    /// Admin flag.
    pub is_admin: bool,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

/// Outcome of a successful credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCheck {
    /// Whether the owner has admin rights.
    pub is_admin: bool,
}
