//! Record store contract consumed by the record service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{OWNER_SORT_KEY, OwnerRecord, fields};

/// Record store failures.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// A conditional put was rejected.
    #[error("condition check failed for {partition_key}")]
    ConditionFailed {
        /// Key the condition was evaluated against.
        partition_key: String,
    },

    /// Transport or service error from the backend.
    #[error("record store error: {0}")]
    Backend(String),

    /// An item could not be mapped onto an owner record.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The call did not complete within the outbound timeout.
    #[error("record store call timed out after {0:?}")]
    Timeout(Duration),
}

impl RecordStoreError {
    /// True when the failure was a timeout and the call may be retried.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Precondition for a put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Only write if no item exists under the record's key.
    NotExists,
}

/// Resume point of a paged scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken {
    /// Partition key of the last item returned.
    pub partition_key: String,
    /// Sort key of the last item returned.
    pub sort_key: String,
}

/// One page of scan results.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// Matching records in this page.
    pub records: Vec<OwnerRecord>,
    /// Where to continue, `None` once the scan is exhausted.
    pub next: Option<PageToken>,
}

/// Field conditions for a scan.
///
/// A record matches when, for every equality entry, the field's value is
/// one of the listed values, and for every inequality entry it is none of
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    /// `field IN values` conditions.
    pub equal: BTreeMap<String, Vec<String>>,
    /// `NOT (field IN values)` conditions.
    pub not_equal: BTreeMap<String, Vec<String>>,
}

impl Default for RecordFilter {
    /// Every owner record: `SKey = "user"`.
    fn default() -> Self {
        Self::empty().equal(fields::SORT_KEY, [OWNER_SORT_KEY])
    }
}

impl RecordFilter {
    /// A filter without any condition.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            equal: BTreeMap::new(),
            not_equal: BTreeMap::new(),
        }
    }

    /// Add an equality condition on `field`.
    #[must_use]
    pub fn equal<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.equal
            .entry(field.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Add an inequality condition on `field`.
    #[must_use]
    pub fn not_equal<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_equal
            .entry(field.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equal.is_empty() && self.not_equal.is_empty()
    }

    /// Evaluate the filter against a record.
    ///
    /// Unknown fields never satisfy an equality and always satisfy an
    /// inequality, as an absent attribute does in a store-side filter.
    /// A condition with no values constrains nothing.
    #[must_use]
    pub fn matches(&self, record: &OwnerRecord) -> bool {
        let equal_ok = self.equal.iter().all(|(field, values)| {
            values.is_empty()
                || record
                    .field(field)
                    .is_some_and(|value| values.contains(&value))
        });
        let not_equal_ok = self.not_equal.iter().all(|(field, values)| {
            record
                .field(field)
                .is_none_or(|value| !values.contains(&value))
        });
        equal_ok && not_equal_ok
    }
}

/// Key-value persistence for owner records.
///
/// Records are addressed by `(partition_key, sort_key)`; owner records use
/// their id and [`OWNER_SORT_KEY`].
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one record, `None` when absent.
    async fn get(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<OwnerRecord>, RecordStoreError>;

    /// Write the whole record, replacing any existing item unless a
    /// condition says otherwise.
    async fn put(
        &self,
        record: &OwnerRecord,
        condition: Option<PutCondition>,
    ) -> Result<(), RecordStoreError>;

    /// Remove one record. Removing a missing record succeeds.
    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), RecordStoreError>;

    /// Read one page of records matching `filter`, starting after `start`.
    async fn scan(
        &self,
        filter: &RecordFilter,
        start: Option<PageToken>,
    ) -> Result<ScanPage, RecordStoreError>;
}
