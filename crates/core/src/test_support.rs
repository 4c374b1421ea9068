//! In-memory doubles of the record and object stores for unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::owner::{
    OwnerRecord, PageToken, PutCondition, RecordFilter, RecordStore, RecordStoreError, ScanPage,
};
use crate::storage::{ObjectStore, PresignedUrl, StorageError};

/// Record store over a `BTreeMap`, with per-operation failure injection.
pub struct MockRecordStore {
    records: Mutex<BTreeMap<(String, String), OwnerRecord>>,
    failing: Mutex<HashSet<&'static str>>,
    page_size: usize,
    pub calls: Mutex<Vec<String>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::with_page_size(2)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(HashSet::new()),
            page_size,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, record: OwnerRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((record.id.clone(), record.sort_key.clone()), record);
    }

    pub fn insert_under(&self, key: &str, record: OwnerRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((key.to_string(), record.sort_key.clone()), record);
    }

    pub fn stored(&self, id: &str) -> Option<OwnerRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(id.to_string(), "user".to_string()))
            .cloned()
    }

    /// Make every later call of `op` fail with a backend error.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.lock().unwrap().remove(op);
    }

    fn enter(&self, op: &'static str, key: &str) -> Result<(), RecordStoreError> {
        self.calls.lock().unwrap().push(format!("{op} {key}"));
        if self.failing.lock().unwrap().contains(op) {
            return Err(RecordStoreError::Backend(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn get(
        &self,
        partition_key: &str,
        sort_key: &str,
    ) -> Result<Option<OwnerRecord>, RecordStoreError> {
        self.enter("get", partition_key)?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(partition_key.to_string(), sort_key.to_string()))
            .cloned())
    }

    async fn put(
        &self,
        record: &OwnerRecord,
        condition: Option<PutCondition>,
    ) -> Result<(), RecordStoreError> {
        self.enter("put", &record.id)?;
        let mut records = self.records.lock().unwrap();
        let key = (record.id.clone(), record.sort_key.clone());
        if condition == Some(PutCondition::NotExists) && records.contains_key(&key) {
            return Err(RecordStoreError::ConditionFailed {
                partition_key: record.id.clone(),
            });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn delete(&self, partition_key: &str, sort_key: &str) -> Result<(), RecordStoreError> {
        self.enter("delete", partition_key)?;
        self.records
            .lock()
            .unwrap()
            .remove(&(partition_key.to_string(), sort_key.to_string()));
        Ok(())
    }

    async fn scan(
        &self,
        filter: &RecordFilter,
        start: Option<PageToken>,
    ) -> Result<ScanPage, RecordStoreError> {
        self.enter("scan", "-")?;
        let records = self.records.lock().unwrap();
        let after = start.map(|t| (t.partition_key, t.sort_key));
        let window: Vec<_> = records
            .iter()
            .filter(|(key, _)| after.as_ref().is_none_or(|a| *key > a))
            .take(self.page_size)
            .collect();
        let next = if window.len() == self.page_size {
            window.last().map(|((pk, sk), _)| PageToken {
                partition_key: pk.clone(),
                sort_key: sk.clone(),
            })
        } else {
            None
        };
        Ok(ScanPage {
            records: window
                .into_iter()
                .filter(|(_, rec)| filter.matches(rec))
                .map(|(_, rec)| rec.clone())
                .collect(),
            next,
        })
    }
}

/// Object store over a `BTreeMap`, with per-operation failure injection.
pub struct MockObjectStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    stall: Mutex<Option<Duration>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(HashSet::new()),
            stall: Mutex::new(None),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn seed(&self, key: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from_static(b"seed"));
    }

    /// Make `op` fail, for every key or only for `key`.
    pub fn fail(&self, op: &str, key: Option<&str>) {
        let entry = match key {
            Some(key) => format!("{op} {key}"),
            None => op.to_string(),
        };
        self.failing.lock().unwrap().insert(entry);
    }

    /// Report a timeout of this length from every call.
    pub fn stall(&self, after: Duration) {
        *self.stall.lock().unwrap() = Some(after);
    }

    fn enter(&self, op: &str, key: &str) -> Result<(), StorageError> {
        if let Some(after) = *self.stall.lock().unwrap() {
            return Err(StorageError::Timeout(after));
        }
        let failing = self.failing.lock().unwrap();
        if failing.contains(op) || failing.contains(&format!("{op} {key}")) {
            return Err(StorageError::operation(format!("injected {op} failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn put(&self, key: &str, content: Bytes) -> Result<(), StorageError> {
        self.enter("put", key)?;
        self.objects.lock().unwrap().insert(key.to_string(), content);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.enter("delete", key)?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn sign(&self, key: &str, ttl: Duration) -> Result<PresignedUrl, StorageError> {
        self.enter("sign", key)?;
        Ok(PresignedUrl {
            url: format!("https://objects.test/{key}?ttl={}", ttl.as_secs()),
        })
    }
}
