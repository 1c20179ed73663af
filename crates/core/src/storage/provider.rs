//! Object store capability consumed by the catalog.

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;

use super::error::StorageError;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Key the bytes were written under.
    pub key: String,
    /// Time-bounded read URL for the object.
    pub url: String,
}

/// One entry of an object listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the store reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Lazy object listing with a single failure channel.
pub type ObjectStream = BoxStream<'static, Result<ObjectInfo, StorageError>>;

/// Capability interface over an external object store.
///
/// Implemented by [`super::StorageService`]; tests substitute in-process
/// fakes.
pub trait ObjectStore: Send + Sync {
    /// Write `content` under `key` and return a read URL for it.
    ///
    /// `size` must equal `content.len()`. On failure nothing is left readable
    /// under `key`.
    fn upload(
        &self,
        content: Bytes,
        size: u64,
        mime_type: &str,
        key: &str,
    ) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;

    /// Delete the object under `key`.
    ///
    /// Absent keys yield [`StorageError::NotFound`] so callers can decide
    /// whether "already gone" is acceptable.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Mint a read URL valid for `expires_in_secs` seconds.
    ///
    /// Does not check that the object exists.
    fn presigned_url(
        &self,
        key: &str,
        expires_in_secs: u64,
    ) -> impl Future<Output = Result<String, StorageError>> + Send;

    /// Lazily list objects whose key starts with `prefix`, in the store's
    /// native order. Each call starts a fresh listing.
    fn list(&self, prefix: &str) -> ObjectStream;

    /// Whether an object exists under `key`.
    ///
    /// `Ok(false)` means confirmed absence; anything else that prevents an
    /// answer is [`StorageError::Unavailable`].
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;
}
