//! File catalog service implementation.

use std::sync::Arc;

use chrono::Utc;
use futures::TryStreamExt;
use tracing::{debug, error, info, warn};

use filegate_shared::types::PageResponse;
use filegate_shared::{AppConfig, FileId};

use super::error::CatalogError;
use super::format::parse_tags;
use super::locks::KeyedLocks;
use super::store::FileRecordStore;
use super::types::{
    FileQuery, FileQueryParams, FileRecord, FileRecordUpdate, MetadataUpdate, NewUpload,
    QueryPage, UploadedFile,
};
use crate::storage::{ObjectInfo, ObjectStore, StorageError, generate_storage_key};

/// Upload limits and URL defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
    /// Longest accepted description, in characters.
    pub max_description_len: usize,
    /// Longest accepted raw tag string, in characters.
    pub max_tags_len: usize,
    /// Lifetime of URLs minted without an explicit expiry.
    pub default_url_ttl_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for CatalogConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_file_size: config.upload.max_file_size,
            allowed_mime_types: config.upload.allowed_mime_types.clone(),
            max_description_len: config.upload.max_description_len,
            max_tags_len: config.upload.max_tags_len,
            default_url_ttl_secs: config.storage.presign_ttl_secs,
        }
    }
}

/// Catalog of uploaded files.
///
/// Owns no state of its own beyond per-id locks: bytes live in the
/// [`ObjectStore`], metadata in the [`FileRecordStore`].
pub struct FileCatalogService<S: ObjectStore, R: FileRecordStore> {
    storage: Arc<S>,
    store: Arc<R>,
    config: CatalogConfig,
    locks: KeyedLocks,
}

impl<S: ObjectStore, R: FileRecordStore> FileCatalogService<S, R> {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(storage: Arc<S>, store: Arc<R>, config: CatalogConfig) -> Self {
        Self {
            storage,
            store,
            config,
            locks: KeyedLocks::new(),
        }
    }

    /// Object store backing this catalog.
    #[must_use]
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Record store backing this catalog.
    #[must_use]
    pub fn store(&self) -> &Arc<R> {
        &self.store
    }

    /// Active limits.
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Store a new file and create its record.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The upload fails validation (nothing is written)
    /// - The object store rejects the write (no record is created)
    /// - The record store rejects the record (the object is removed again)
    pub async fn upload(&self, upload: NewUpload) -> Result<UploadedFile, CatalogError> {
        self.validate_upload(&upload)?;

        let key = generate_storage_key(&upload.original_name);
        let tags = upload.tags.as_deref().map(parse_tags).unwrap_or_default();

        let stored = self
            .storage
            .upload(upload.content, upload.size, &upload.mime_type, &key)
            .await
            .map_err(|source| {
                warn!(key = %key, error = %source, "Object upload failed");
                CatalogError::UploadFailed {
                    key: key.clone(),
                    source,
                }
            })?;

        let now = Utc::now();
        let record = FileRecord {
            id: FileId::new(),
            storage_key: stored.key,
            original_name: upload.original_name,
            mime_type: upload.mime_type,
            size: upload.size,
            description: upload.description.filter(|d| !d.is_empty()),
            tags,
            uploaded_at: now,
            updated_at: now,
        };

        match self.store.insert(record).await {
            Ok(record) => {
                info!(
                    file_id = %record.id,
                    key = %record.storage_key,
                    size = record.size,
                    mime_type = %record.mime_type,
                    "File uploaded"
                );
                Ok(UploadedFile {
                    record,
                    url: stored.url,
                })
            }
            Err(err) => {
                if let CatalogError::DuplicateId(id) = &err {
                    error!(file_id = %id, "Generated file id collided with an existing record");
                }
                if let Err(cleanup) = self.storage.delete(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove object after record insert failed");
                }
                Err(err)
            }
        }
    }

    /// Run a query given as raw gateway parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for malformed parameters, or a
    /// record store error.
    pub async fn query_files(
        &self,
        params: &FileQueryParams,
    ) -> Result<PageResponse<FileRecord>, CatalogError> {
        let query = FileQuery::try_from(params)?;
        let QueryPage { records, total } = self.query(&query).await?;
        Ok(PageResponse::new(records, query.page, total))
    }

    /// Run a validated query.
    ///
    /// # Errors
    ///
    /// Returns a record store error.
    pub async fn query(&self, query: &FileQuery) -> Result<QueryPage, CatalogError> {
        query
            .page
            .validate()
            .map_err(|e| CatalogError::validation(e.to_string()))?;

        let page = self.store.query(query).await?;
        debug!(
            search = ?query.search,
            mime_type = ?query.mime_type,
            sort_by = %query.sort_by,
            sort_order = %query.sort_order,
            page = query.page.page,
            returned = page.records.len(),
            total = page.total,
            "Queried files"
        );
        Ok(page)
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no record has this id.
    pub async fn get_file(&self, id: FileId) -> Result<FileRecord, CatalogError> {
        self.store
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Fetch one record together with a fresh read URL.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`], a validation error for a zero
    /// expiry, or a storage error from presigning.
    pub async fn get_file_with_url(
        &self,
        id: FileId,
        expires_in_secs: Option<u64>,
    ) -> Result<UploadedFile, CatalogError> {
        let record = self.get_file(id).await?;
        let url = self.presign(&record, expires_in_secs).await?;
        Ok(UploadedFile { record, url })
    }

    /// Mint a read URL for the file with this id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`], a validation error for a zero
    /// expiry, or a storage error from presigning.
    pub async fn get_file_url(
        &self,
        id: FileId,
        expires_in_secs: Option<u64>,
    ) -> Result<String, CatalogError> {
        let record = self.get_file(id).await?;
        self.presign(&record, expires_in_secs).await
    }

    /// Replace description and/or tags of a record.
    ///
    /// # Errors
    ///
    /// Returns a validation error for oversized values or
    /// [`CatalogError::NotFound`].
    pub async fn update_metadata(
        &self,
        id: FileId,
        update: MetadataUpdate,
    ) -> Result<FileRecord, CatalogError> {
        if let Some(description) = &update.description {
            self.check_description(description)?;
        }
        if let Some(tags) = &update.tags {
            self.check_tags(tags)?;
        }

        let guard = self.locks.lock(id).await;
        let result = self
            .store
            .update(
                id,
                FileRecordUpdate {
                    description: update.description,
                    tags: update.tags.as_deref().map(parse_tags),
                },
            )
            .await;
        drop(guard);
        self.locks.release(id);

        let record = result?;
        info!(file_id = %id, "File metadata updated");
        Ok(record)
    }

    /// Delete a file's object and then its record.
    ///
    /// An object that is already gone does not block removal of the record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no record has this id, or
    /// [`CatalogError::DeleteFailed`] when the object store fails; the record
    /// is kept in that case.
    pub async fn delete_file(&self, id: FileId) -> Result<(), CatalogError> {
        let guard = self.locks.lock(id).await;
        let result = self.delete_locked(id).await;
        drop(guard);
        self.locks.release(id);
        result
    }

    async fn delete_locked(&self, id: FileId) -> Result<(), CatalogError> {
        let record = self.get_file(id).await?;

        match self.storage.delete(&record.storage_key).await {
            Ok(()) => {}
            Err(source) if source.is_not_found() => {
                warn!(file_id = %id, key = %record.storage_key, "Object already missing; removing record");
            }
            Err(source @ StorageError::Unavailable(_)) => {
                error!(file_id = %id, key = %record.storage_key, error = %source, "Object state unknown; record kept");
                return Err(CatalogError::StorageUnavailable {
                    id,
                    key: record.storage_key,
                    source,
                });
            }
            Err(source) => {
                error!(file_id = %id, key = %record.storage_key, error = %source, "Object delete failed; record kept");
                return Err(CatalogError::DeleteFailed {
                    id,
                    key: record.storage_key,
                    source,
                });
            }
        }

        self.store.delete_by_id(id).await?;
        info!(file_id = %id, key = %record.storage_key, "File deleted");
        Ok(())
    }

    /// List raw objects under a key prefix.
    ///
    /// # Errors
    ///
    /// Returns the first storage error raised by the listing.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>, CatalogError> {
        let objects: Vec<ObjectInfo> = self.storage.list(prefix).try_collect().await?;
        debug!(prefix = %prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn presign(
        &self,
        record: &FileRecord,
        expires_in_secs: Option<u64>,
    ) -> Result<String, CatalogError> {
        let expires_in = expires_in_secs.unwrap_or(self.config.default_url_ttl_secs);
        if expires_in == 0 {
            return Err(CatalogError::validation(
                "expiresIn must be greater than zero",
            ));
        }

        Ok(self
            .storage
            .presigned_url(&record.storage_key, expires_in)
            .await?)
    }

    fn validate_upload(&self, upload: &NewUpload) -> Result<(), CatalogError> {
        let actual = u64::try_from(upload.content.len()).unwrap_or(u64::MAX);
        if upload.size != actual {
            return Err(CatalogError::validation(format!(
                "declared size {} does not match content length {actual}",
                upload.size
            )));
        }

        if upload.size > self.config.max_file_size {
            return Err(CatalogError::FileTooLarge {
                size: upload.size,
                max: self.config.max_file_size,
            });
        }

        if !self
            .config
            .allowed_mime_types
            .iter()
            .any(|allowed| allowed == &upload.mime_type)
        {
            return Err(CatalogError::InvalidMimeType(upload.mime_type.clone()));
        }

        if let Some(description) = &upload.description {
            self.check_description(description)?;
        }
        if let Some(tags) = &upload.tags {
            self.check_tags(tags)?;
        }

        if upload.original_name.trim().is_empty() {
            return Err(CatalogError::validation("file name must not be empty"));
        }

        Ok(())
    }

    fn check_description(&self, description: &str) -> Result<(), CatalogError> {
        let len = description.chars().count();
        if len > self.config.max_description_len {
            return Err(CatalogError::validation(format!(
                "description is {len} characters; maximum is {}",
                self.config.max_description_len
            )));
        }
        Ok(())
    }

    fn check_tags(&self, tags: &str) -> Result<(), CatalogError> {
        let len = tags.chars().count();
        if len > self.config.max_tags_len {
            return Err(CatalogError::validation(format!(
                "tags are {len} characters; maximum is {}",
                self.config.max_tags_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::store::InMemoryFileStore;
    use crate::catalog::types::{SortBy, SortOrder};
    use crate::storage::{ObjectStream, StoredObject};
    use bytes::Bytes;
    use filegate_shared::AppError;
    use futures::stream;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-process object store with failure switches.
    #[derive(Default)]
    pub(crate) struct MockObjectStore {
        objects: Mutex<BTreeMap<String, Bytes>>,
        pub(crate) fail_upload: AtomicBool,
        pub(crate) fail_delete: AtomicBool,
        pub(crate) unreachable: AtomicBool,
    }

    impl MockObjectStore {
        pub(crate) fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }

        pub(crate) fn count(&self) -> usize {
            self.objects.lock().unwrap().len()
        }

        pub(crate) fn remove(&self, key: &str) {
            self.objects.lock().unwrap().remove(key);
        }
    }

    impl ObjectStore for MockObjectStore {
        async fn upload(
            &self,
            content: Bytes,
            size: u64,
            _mime_type: &str,
            key: &str,
        ) -> Result<StoredObject, StorageError> {
            if self.fail_upload.load(Ordering::SeqCst) {
                return Err(StorageError::write(key, "bucket is read-only"));
            }
            assert_eq!(size, content.len() as u64);
            self.objects.lock().unwrap().insert(key.to_string(), content);
            Ok(StoredObject {
                key: key.to_string(),
                url: format!("https://store.test/{key}?expires=86400"),
            })
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable(format!("stat '{key}': timed out")));
            }
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(StorageError::operation("connection reset"));
            }
            match self.objects.lock().unwrap().remove(key) {
                Some(_) => Ok(()),
                None => Err(StorageError::not_found(key)),
            }
        }

        async fn presigned_url(
            &self,
            key: &str,
            expires_in_secs: u64,
        ) -> Result<String, StorageError> {
            if expires_in_secs == 0 {
                return Err(StorageError::InvalidExpiry(0));
            }
            Ok(format!("https://store.test/{key}?expires={expires_in_secs}"))
        }

        fn list(&self, prefix: &str) -> ObjectStream {
            let items: Vec<_> = self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|(key, _)| key.starts_with(prefix))
                .map(|(key, content)| {
                    Ok(ObjectInfo {
                        key: key.clone(),
                        size: content.len() as u64,
                        last_modified: None,
                    })
                })
                .collect();
            Box::pin(stream::iter(items))
        }

        async fn exists(&self, key: &str) -> Result<bool, StorageError> {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable(format!("stat '{key}': timed out")));
            }
            Ok(self.contains(key))
        }
    }

    /// Record store that accepts nothing.
    struct RejectingStore;

    impl FileRecordStore for RejectingStore {
        async fn insert(&self, record: FileRecord) -> Result<FileRecord, CatalogError> {
            Err(CatalogError::DuplicateStorageKey(record.storage_key))
        }

        async fn get_by_id(&self, _id: FileId) -> Result<Option<FileRecord>, CatalogError> {
            Ok(None)
        }

        async fn query(&self, _query: &FileQuery) -> Result<QueryPage, CatalogError> {
            Ok(QueryPage::default())
        }

        async fn delete_by_id(&self, id: FileId) -> Result<FileRecord, CatalogError> {
            Err(CatalogError::NotFound(id))
        }

        async fn update(
            &self,
            id: FileId,
            _update: FileRecordUpdate,
        ) -> Result<FileRecord, CatalogError> {
            Err(CatalogError::NotFound(id))
        }
    }

    pub(crate) type TestCatalog = FileCatalogService<MockObjectStore, InMemoryFileStore>;

    pub(crate) fn catalog() -> TestCatalog {
        FileCatalogService::new(
            Arc::new(MockObjectStore::default()),
            Arc::new(InMemoryFileStore::new()),
            CatalogConfig::default(),
        )
    }

    fn png(name: &str, len: usize) -> NewUpload {
        NewUpload::new(vec![7u8; len], "image/png", name)
    }

    #[tokio::test]
    async fn test_upload_then_get_round_trip() {
        let catalog = catalog();
        let uploaded = catalog
            .upload(
                png("a.png", 1024)
                    .with_description("avatar")
                    .with_tags(" profile, ,image "),
            )
            .await
            .unwrap();

        let record = &uploaded.record;
        assert_eq!(record.original_name, "a.png");
        assert_eq!(record.mime_type, "image/png");
        assert_eq!(record.size, 1024);
        assert_eq!(record.description.as_deref(), Some("avatar"));
        assert_eq!(record.tags, vec!["profile", "image"]);
        assert_eq!(record.uploaded_at, record.updated_at);
        assert!(record.storage_key.ends_with("-a.png"));
        assert!(uploaded.url.contains(&record.storage_key));
        assert!(catalog.storage().contains(&record.storage_key));

        let fetched = catalog.get_file(record.id).await.unwrap();
        assert_eq!(&fetched, record);
    }

    #[tokio::test]
    async fn test_upload_sanitizes_storage_key() {
        let catalog = catalog();
        let uploaded = catalog
            .upload(png("my photo (1).png", 4))
            .await
            .unwrap();

        let key = &uploaded.record.storage_key;
        assert!(key.ends_with("-my_photo__1_.png"));
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
        assert_eq!(uploaded.record.original_name, "my photo (1).png");
    }

    #[tokio::test]
    async fn test_same_name_uploads_get_distinct_keys() {
        let catalog = catalog();
        let a = catalog.upload(png("a.png", 1)).await.unwrap();
        let b = catalog.upload(png("a.png", 1)).await.unwrap();
        assert_ne!(a.record.id, b.record.id);
        assert_ne!(a.record.storage_key, b.record.storage_key);
        assert_eq!(catalog.storage().count(), 2);
    }

    #[tokio::test]
    async fn test_upload_validation_touches_nothing() {
        let catalog = catalog();

        let mut mismatched = png("a.png", 10);
        mismatched.size = 11;
        let too_large = png("big.png", 10 * 1024 * 1024 + 1);
        let wrong_type = NewUpload::new(vec![1u8; 4], "application/x-msdownload", "a.exe");
        let long_description = png("a.png", 4).with_description("x".repeat(501));
        let long_tags = png("a.png", 4).with_tags("t".repeat(201));
        let blank_name = png("   ", 4);

        assert!(matches!(
            catalog.upload(mismatched).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog.upload(too_large).await,
            Err(CatalogError::FileTooLarge { max, .. }) if max == 10 * 1024 * 1024
        ));
        assert!(matches!(
            catalog.upload(wrong_type).await,
            Err(CatalogError::InvalidMimeType(ref m)) if m == "application/x-msdownload"
        ));
        assert!(matches!(
            catalog.upload(long_description).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog.upload(long_tags).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog.upload(blank_name).await,
            Err(CatalogError::Validation(_))
        ));

        assert_eq!(catalog.storage().count(), 0);
        assert!(catalog.store().is_empty());
    }

    #[tokio::test]
    async fn test_upload_at_limits_is_accepted() {
        let catalog = catalog();
        let upload = png("max.png", 10 * 1024 * 1024)
            .with_description("d".repeat(500))
            .with_tags("t".repeat(200));
        assert!(catalog.upload(upload).await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_on_upload_leaves_no_record() {
        let catalog = catalog();
        catalog.storage().fail_upload.store(true, Ordering::SeqCst);

        let err = catalog.upload(png("a.png", 4)).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::UploadFailed { ref key, source: StorageError::Write { .. } } if key.ends_with("-a.png")
        ));
        assert!(catalog.store().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_removes_written_object() {
        let catalog = FileCatalogService::new(
            Arc::new(MockObjectStore::default()),
            Arc::new(RejectingStore),
            CatalogConfig::default(),
        );

        let err = catalog.upload(png("a.png", 4)).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateStorageKey(_)));
        assert_eq!(catalog.storage().count(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let catalog = catalog();
        let id = FileId::new();
        assert!(matches!(
            catalog.get_file(id).await,
            Err(CatalogError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        let id = uploaded.record.id;

        catalog.delete_file(id).await.unwrap();
        assert!(!catalog.storage().contains(&uploaded.record.storage_key));
        assert!(matches!(
            catalog.get_file(id).await,
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            catalog.delete_file(id).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_with_object_already_gone_removes_record() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        catalog.storage().remove(&uploaded.record.storage_key);

        catalog.delete_file(uploaded.record.id).await.unwrap();
        assert!(catalog.store().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_on_delete_keeps_record() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        catalog.storage().fail_delete.store(true, Ordering::SeqCst);

        let err = catalog.delete_file(uploaded.record.id).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DeleteFailed { id, ref key, .. }
                if id == uploaded.record.id && *key == uploaded.record.storage_key
        ));
        assert!(catalog.get_file(uploaded.record.id).await.is_ok());
        assert!(catalog.storage().contains(&uploaded.record.storage_key));
    }

    #[tokio::test]
    async fn test_unknown_object_state_on_delete_keeps_record() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        catalog.storage().unreachable.store(true, Ordering::SeqCst);

        let err = catalog.delete_file(uploaded.record.id).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::StorageUnavailable { id, ref key, .. }
                if id == uploaded.record.id && *key == uploaded.record.storage_key
        ));
        assert_eq!(AppError::from(err).status_code(), 503);
        assert!(catalog.get_file(uploaded.record.id).await.is_ok());
        assert!(catalog.storage().contains(&uploaded.record.storage_key));

        catalog.storage().unreachable.store(false, Ordering::SeqCst);
        catalog.delete_file(uploaded.record.id).await.unwrap();
        assert!(catalog.store().is_empty());
    }

    #[tokio::test]
    async fn test_get_file_url_by_id() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        let id = uploaded.record.id;

        let url = catalog.get_file_url(id, None).await.unwrap();
        assert!(url.ends_with("expires=86400"));

        let url = catalog.get_file_url(id, Some(60)).await.unwrap();
        assert!(url.contains(&uploaded.record.storage_key));
        assert!(url.ends_with("expires=60"));

        assert!(matches!(
            catalog.get_file_url(id, Some(0)).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog.get_file_url(FileId::new(), None).await,
            Err(CatalogError::NotFound(_))
        ));

        let with_url = catalog.get_file_with_url(id, Some(120)).await.unwrap();
        assert_eq!(with_url.record, uploaded.record);
        assert!(with_url.url.ends_with("expires=120"));
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let catalog = catalog();
        let uploaded = catalog
            .upload(png("a.png", 4).with_description("old").with_tags("a,b"))
            .await
            .unwrap();
        let id = uploaded.record.id;

        let updated = catalog
            .update_metadata(
                id,
                MetadataUpdate {
                    description: None,
                    tags: Some("x, y".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("old"));
        assert_eq!(updated.tags, vec!["x", "y"]);
        assert!(updated.updated_at >= uploaded.record.updated_at);

        let cleared = catalog
            .update_metadata(
                id,
                MetadataUpdate {
                    description: Some(String::new()),
                    tags: Some(String::new()),
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
        assert!(cleared.tags.is_empty());

        assert!(matches!(
            catalog
                .update_metadata(
                    id,
                    MetadataUpdate {
                        description: Some("x".repeat(501)),
                        tags: None,
                    },
                )
                .await,
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            catalog
                .update_metadata(FileId::new(), MetadataUpdate::default())
                .await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_search_scenario() {
        let catalog = catalog();
        let a = catalog.upload(png("a.png", 1024)).await.unwrap();
        catalog.upload(png("Profile.png", 8)).await.unwrap();
        catalog.upload(png("my-profile-pic.png", 16)).await.unwrap();
        catalog.upload(png("notes.png", 32)).await.unwrap();

        let params = FileQueryParams {
            search: Some("PROFILE".into()),
            sort_by: Some("size".into()),
            sort_order: Some("asc".into()),
            ..FileQueryParams::default()
        };
        let page = catalog.query_files(&params).await.unwrap();
        let names: Vec<_> = page.data.iter().map(|r| r.original_name.as_str()).collect();
        assert_eq!(names, vec!["Profile.png", "my-profile-pic.png"]);
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.total_pages, 1);

        let all = catalog.query_files(&FileQueryParams::default()).await.unwrap();
        assert_eq!(all.pagination.total, 4);
        assert!(all.data.iter().any(|r| r.id == a.record.id));
        assert_eq!(a.record.formatted_size(), "1 KB");
    }

    #[tokio::test]
    async fn test_upload_query_delete_scenario() {
        let catalog = catalog();
        let uploaded = catalog.upload(png("a.png", 100)).await.unwrap();

        let page = catalog.query_files(&FileQueryParams::default()).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.pagination.total_pages, 1);
        assert_eq!(page.data[0].size, 100);
        assert_eq!(page.data[0].mime_type, "image/png");

        catalog.delete_file(uploaded.record.id).await.unwrap();

        let page = catalog.query_files(&FileQueryParams::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_params_before_store() {
        let catalog = FileCatalogService::new(
            Arc::new(MockObjectStore::default()),
            Arc::new(RejectingStore),
            CatalogConfig::default(),
        );
        let params = FileQueryParams {
            limit: Some(0),
            ..FileQueryParams::default()
        };
        assert!(matches!(
            catalog.query_files(&params).await,
            Err(CatalogError::Validation(_))
        ));

        let query = FileQuery::default().sorted(SortBy::FileName, SortOrder::Asc);
        assert_eq!(catalog.query(&query).await.unwrap(), QueryPage::default());
    }

    #[tokio::test]
    async fn test_empty_catalog_has_zero_pages() {
        let catalog = catalog();
        let page = catalog.query_files(&FileQueryParams::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn test_list_objects_by_prefix() {
        let catalog = catalog();
        let a = catalog.upload(png("a.png", 3)).await.unwrap();
        catalog.upload(png("b.png", 5)).await.unwrap();

        let all = catalog.list_objects("").await.unwrap();
        assert_eq!(all.len(), 2);

        let prefix = &a.record.storage_key[..8];
        let some = catalog.list_objects(prefix).await.unwrap();
        assert!(some.iter().any(|o| o.key == a.record.storage_key && o.size == 3));
    }

    #[tokio::test]
    async fn test_concurrent_deletes_of_same_id() {
        let catalog = Arc::new(catalog());
        let uploaded = catalog.upload(png("a.png", 4)).await.unwrap();
        let id = uploaded.record.id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move { catalog.delete_file(id).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(CatalogError::NotFound(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(ok, 1);
        assert!(catalog.store().is_empty());
    }

    #[test]
    fn test_default_limits() {
        let config = CatalogConfig::default();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.max_description_len, 500);
        assert_eq!(config.max_tags_len, 200);
        assert_eq!(config.default_url_ttl_secs, 86_400);
        assert_eq!(config.allowed_mime_types.len(), 7);
        assert!(config.allowed_mime_types.iter().any(|m| m == "application/json"));
    }
}
