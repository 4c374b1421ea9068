//! Record service: owner CRUD and credential checks over a [`RecordStore`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::{OwnerError, WriteStep};
use super::store::{PutCondition, RecordFilter, RecordStore};
use super::types::{
    CredentialCheck, Credentials, NewOwner, OWNER_SORT_KEY, OwnerRecord, Profile, fields,
};
use crate::auth::{hash_password, verify_password};

/// Owner record operations.
///
/// Every write replaces the whole record. There is no per-owner locking, so
/// concurrent writers race and the last write wins.
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    /// Create a record service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist a new record. Fails if a record with the same id exists.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::StoreWriteFailed`] when the store rejects the put.
    pub async fn create(&self, record: OwnerRecord) -> Result<OwnerRecord, OwnerError> {
        self.store
            .put(&record, Some(PutCondition::NotExists))
            .await
            .map_err(|source| OwnerError::StoreWriteFailed {
                id: record.id.clone(),
                step: WriteStep::Create,
                source,
            })?;
        info!(owner_id = %record.id, "owner record created");
        Ok(record)
    }

    /// Hash the password and create a record with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing or the store write fails.
    pub async fn register(&self, input: NewOwner) -> Result<OwnerRecord, OwnerError> {
        let password_hash = hash_password(&input.password)?;
        let record = OwnerRecord::new(
            Profile {
                first_name: input.first_name,
                last_name: input.last_name,
                is_admin: input.is_admin,
            },
            Credentials {
                email_address: input.email_address,
                password_hash,
            },
        );
        self.create(record).await
    }

    /// Fetch a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::NotFound`] for an empty id or a missing record.
    pub async fn get(&self, id: &str) -> Result<OwnerRecord, OwnerError> {
        if id.is_empty() {
            return Err(OwnerError::NotFound(String::new()));
        }
        self.store
            .get(id, OWNER_SORT_KEY)
            .await
            .map_err(OwnerError::StoreRead)?
            .ok_or_else(|| OwnerError::NotFound(id.to_string()))
    }

    /// Fetch a record and check that it is a usable owner.
    ///
    /// A record whose id comes back empty is treated as missing.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::NotFound`] when the owner cannot be used.
    pub async fn get_and_validate(&self, id: &str) -> Result<OwnerRecord, OwnerError> {
        let record = self.get(id).await?;
        if record.id.is_empty() {
            warn!(owner_id = %id, "store returned a record without id");
            return Err(OwnerError::NotFound(id.to_string()));
        }
        Ok(record)
    }

    /// Replace a record: delete it, then write it again.
    ///
    /// If the second step fails the record is gone from the store until a
    /// later write restores it.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::StoreWriteFailed`] naming the failed step.
    pub async fn update(&self, record: OwnerRecord) -> Result<OwnerRecord, OwnerError> {
        self.store
            .delete(&record.id, &record.sort_key)
            .await
            .map_err(|source| OwnerError::StoreWriteFailed {
                id: record.id.clone(),
                step: WriteStep::Delete,
                source,
            })?;

        if let Err(source) = self.store.put(&record, None).await {
            warn!(owner_id = %record.id, error = %source, "owner record deleted but not re-created");
            return Err(OwnerError::StoreWriteFailed {
                id: record.id.clone(),
                step: WriteStep::Recreate,
                source,
            });
        }

        debug!(owner_id = %record.id, attachments = record.attachments.len(), "owner record replaced");
        Ok(record)
    }

    /// Remove a record. Its attachment blobs are left in the object store.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::StoreWriteFailed`] when the store call fails.
    pub async fn delete(&self, id: &str) -> Result<(), OwnerError> {
        self.store
            .delete(id, OWNER_SORT_KEY)
            .await
            .map_err(|source| OwnerError::StoreWriteFailed {
                id: id.to_string(),
                step: WriteStep::Delete,
                source,
            })?;
        info!(owner_id = %id, "owner record deleted");
        Ok(())
    }

    /// All records matching `filter`, every owner record when `None`.
    ///
    /// Drains the store's pagination before returning.
    ///
    /// # Errors
    ///
    /// Returns [`OwnerError::StoreRead`] if any page fails.
    pub async fn list(&self, filter: Option<RecordFilter>) -> Result<Vec<OwnerRecord>, OwnerError> {
        let filter = filter.unwrap_or_default();
        let mut records = Vec::new();
        let mut start = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .scan(&filter, start)
                .await
                .map_err(OwnerError::StoreRead)?;
            pages += 1;
            records.extend(page.records);
            match page.next {
                Some(token) => start = Some(token),
                None => break,
            }
        }

        debug!(count = records.len(), pages, "owner records listed");
        Ok(records)
    }

    /// Check an e-mail and password pair.
    ///
    /// # Errors
    ///
    /// - [`OwnerError::EmailNotFound`] if no record has the e-mail
    /// - [`OwnerError::AmbiguousCredentials`] if several do
    /// - [`OwnerError::Unauthorized`] if the password does not match
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<CredentialCheck, OwnerError> {
        let filter = RecordFilter::default().equal(fields::EMAIL, [email]);
        let mut matches = self.list(Some(filter)).await?;

        let record = match matches.len() {
            0 => return Err(OwnerError::EmailNotFound(email.to_string())),
            1 => matches.remove(0),
            n => {
                warn!(email, matches = n, "several owners share one e-mail");
                return Err(OwnerError::AmbiguousCredentials {
                    email: email.to_string(),
                    matches: n,
                });
            }
        };

        if !verify_password(password, &record.credentials.password_hash)? {
            info!(owner_id = %record.id, "password mismatch");
            return Err(OwnerError::Unauthorized);
        }

        Ok(CredentialCheck {
            is_admin: record.profile.is_admin,
        })
    }
}
