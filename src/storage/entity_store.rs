//! Entity store seam for address records
//!
//! The ledger only needs point lookups, one filtered scan and upserts.
//! `set_many` writes a batch atomically so a transfer's debits and credit
//! land together.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::storage::models::{AddressRecord, RecordFilter};

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned: {0}")]
    Lock(String),
}

/// Keyed record storage used by the in-memory ledger
///
/// `query` must return records in insertion order. Updating an existing
/// record keeps its original position.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a record by address
    async fn get(&self, address: &str) -> Result<Option<AddressRecord>, StorageError>;

    /// Insert or replace a single record
    async fn set(&self, record: &AddressRecord) -> Result<(), StorageError>;

    /// Insert or replace several records as one atomic write
    async fn set_many(&self, records: &[AddressRecord]) -> Result<(), StorageError>;

    /// Return all records matching `filter`, in insertion order
    async fn query(&self, filter: &RecordFilter) -> Result<Vec<AddressRecord>, StorageError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    records: Vec<AddressRecord>,
    index: HashMap<String, usize>,
}

impl MemoryInner {
    fn upsert(&mut self, record: &AddressRecord) {
        match self.index.get(&record.address) {
            Some(&position) => self.records[position] = record.clone(),
            None => {
                self.index
                    .insert(record.address.clone(), self.records.len());
                self.records.push(record.clone());
            }
        }
    }
}

/// Process-local entity store
///
/// Backed by a vector plus an address index so scans keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with records in the given order
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AddressRecord>,
    {
        let mut inner = MemoryInner::default();
        for record in records {
            inner.upsert(&record);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn get(&self, address: &str) -> Result<Option<AddressRecord>, StorageError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(inner
            .index
            .get(address)
            .map(|&position| inner.records[position].clone()))
    }

    async fn set(&self, record: &AddressRecord) -> Result<(), StorageError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        inner.upsert(record);
        Ok(())
    }

    async fn set_many(&self, records: &[AddressRecord]) -> Result<(), StorageError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        for record in records {
            inner.upsert(record);
        }
        Ok(())
    }

    async fn query(&self, filter: &RecordFilter) -> Result<Vec<AddressRecord>, StorageError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(inner
            .records
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}
