//! File record persistence.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use filegate_shared::FileId;

use super::error::CatalogError;
use super::query::run_query;
use super::types::{FileQuery, FileRecord, FileRecordUpdate, QueryPage};

/// Repository trait for file record persistence.
///
/// The in-memory store below backs tests and database-less runs; the db crate
/// provides a PostgreSQL implementation with the same contract.
pub trait FileRecordStore: Send + Sync {
    /// Insert a new record.
    ///
    /// Fails with [`CatalogError::DuplicateId`] or
    /// [`CatalogError::DuplicateStorageKey`] without modifying the store.
    fn insert(
        &self,
        record: FileRecord,
    ) -> impl Future<Output = Result<FileRecord, CatalogError>> + Send;

    /// Find a record by id.
    fn get_by_id(
        &self,
        id: FileId,
    ) -> impl Future<Output = Result<Option<FileRecord>, CatalogError>> + Send;

    /// Filter, sort and paginate records.
    fn query(
        &self,
        query: &FileQuery,
    ) -> impl Future<Output = Result<QueryPage, CatalogError>> + Send;

    /// Remove a record, returning it.
    fn delete_by_id(
        &self,
        id: FileId,
    ) -> impl Future<Output = Result<FileRecord, CatalogError>> + Send;

    /// Replace description and/or tags and refresh `updated_at`.
    fn update(
        &self,
        id: FileId,
        update: FileRecordUpdate,
    ) -> impl Future<Output = Result<FileRecord, CatalogError>> + Send;
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<FileId, FileRecord>,
    keys: HashMap<String, FileId>,
    order: BTreeSet<(DateTime<Utc>, FileId)>,
}

/// Record store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    inner: RwLock<Inner>,
}

impl InMemoryFileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileRecordStore for InMemoryFileStore {
    async fn insert(&self, record: FileRecord) -> Result<FileRecord, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.records.contains_key(&record.id) {
            return Err(CatalogError::DuplicateId(record.id));
        }
        if inner.keys.contains_key(&record.storage_key) {
            return Err(CatalogError::DuplicateStorageKey(record.storage_key));
        }

        inner.keys.insert(record.storage_key.clone(), record.id);
        inner.order.insert((record.uploaded_at, record.id));
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: FileId) -> Result<Option<FileRecord>, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.records.get(&id).cloned())
    }

    async fn query(&self, query: &FileQuery) -> Result<QueryPage, CatalogError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let ordered = inner
            .order
            .iter()
            .filter_map(|(_, id)| inner.records.get(id));
        Ok(run_query(ordered, query))
    }

    async fn delete_by_id(&self, id: FileId) -> Result<FileRecord, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let record = inner
            .records
            .remove(&id)
            .ok_or(CatalogError::NotFound(id))?;
        inner.keys.remove(&record.storage_key);
        inner.order.remove(&(record.uploaded_at, record.id));
        Ok(record)
    }

    async fn update(
        &self,
        id: FileId,
        update: FileRecordUpdate,
    ) -> Result<FileRecord, CatalogError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let record = inner
            .records
            .get_mut(&id)
            .ok_or(CatalogError::NotFound(id))?;
        record.apply(update, Utc::now());
        Ok(record.clone())
    }
}
