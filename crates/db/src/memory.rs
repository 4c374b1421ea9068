//! In-process record store for development and tests.

use async_trait::async_trait;
use coffer_core::owner::{
    OwnerRecord, PageToken, PutCondition, RecordFilter, RecordStore, RecordStoreError, ScanPage,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Items examined per scan page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

type Key = (String, String);

/// [`RecordStore`] held in a concurrent map. Contents are lost on restart.
///
/// Scans walk keys in order and, like DynamoDB, apply the filter after
/// cutting the page, so a page may hold fewer matches than its size.
#[derive(Debug)]
pub struct MemoryRecordStore {
    items: DashMap<Key, OwnerRecord>,
    page_size: usize,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Create an empty store with [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store examining `page_size` items per scan page.
    #[must_use]
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: DashMap::new(),
            page_size: page_size.max(1),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<OwnerRecord>, RecordStoreError> {
        Ok(self
            .items
            .get(&(partition_key.to_string(), sort_key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    async fn put(
        &self,
        record: &OwnerRecord,
        condition: Option<PutCondition>,
    ) -> Result<(), RecordStoreError> {
        let key = (record.id.clone(), record.sort_key.clone());
        match (self.items.entry(key), condition) {
            (Entry::Occupied(_), Some(PutCondition::NotExists)) => {
                Err(RecordStoreError::ConditionFailed {
                    partition_key: record.id.clone(),
                })
            }
            (Entry::Occupied(mut slot), None) => {
                slot.insert(record.clone());
                Ok(())
            }
            (Entry::Vacant(slot), _) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), RecordStoreError> {
        self.items
            .remove(&(partition_key.to_string(), sort_key.to_string()));
        Ok(())
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        start: Option<PageToken>,
    ) -> Result<ScanPage, RecordStoreError> {
        let mut keys: Vec<Key> = self.items.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();

        let after = start.map(|token| (token.partition_key, token.sort_key));
        let window: Vec<Key> = keys
            .into_iter()
            .filter(|key| after.as_ref().is_none_or(|after| key > after))
            .take(self.page_size)
            .collect();

        let next = if window.len() == self.page_size {
            window.last().map(|(pk, sk)| PageToken {
                partition_key: pk.clone(),
                sort_key: sk.clone(),
            })
        } else {
            None
        };

        let records = window
            .iter()
            .filter_map(|key| self.items.get(key).map(|entry| entry.value().clone()))
            .filter(|record| filter.matches(record))
            .collect();

        Ok(ScanPage { records, next })
    }
}
