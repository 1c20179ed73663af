//! Storage service implementation using Apache OpenDAL.

use std::time::{Duration, SystemTime};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, future, stream};
use futures::stream::BoxStream;
use opendal::{Entry, ErrorKind, Metadata, Operator, services};
use tracing::{debug, info, warn};

use super::bucket::{S3BucketAdmin, ensure_bucket};
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::key::validate_key;
use super::provider::{ObjectInfo, ObjectStore, ObjectStream, StoredObject};

/// Storage service for uploaded files.
#[derive(Debug, Clone)]
pub struct StorageService {
    operator: Operator,
    bucket_admin: Option<S3BucketAdmin>,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        let bucket_admin = match &config.provider {
            StorageProvider::S3 {
                endpoint,
                access_key_id,
                secret_access_key,
                region,
                ..
            } => Some(S3BucketAdmin::new(
                endpoint,
                access_key_id,
                secret_access_key,
                region,
            )),
            StorageProvider::LocalFs { .. } | StorageProvider::Memory => None,
        };
        Ok(Self {
            operator,
            bucket_admin,
            config,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map(|b| b.finish())
                    .map_err(|e| StorageError::configuration(e.to_string()))
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map(|b| b.finish())
                    .map_err(|e| StorageError::configuration(e.to_string()))
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map(|b| b.finish())
                .map_err(|e| StorageError::configuration(e.to_string())),
        }
    }

    /// Make sure the bucket/container is usable, creating it if missing.
    ///
    /// Safe to call repeatedly and from several processes: "already exists"
    /// counts as success.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the container is missing and cannot
    /// be created, or cannot be reached.
    pub async fn ensure_container(&self) -> Result<(), StorageError> {
        if let Some(admin) = &self.bucket_admin {
            ensure_bucket(admin, self.bucket()).await?;
        } else {
            match self.operator.create_dir("/").await {
                Ok(()) => {}
                Err(e) if matches!(e.kind(), ErrorKind::AlreadyExists | ErrorKind::Unsupported) => {
                    debug!(error = %e, "Container creation skipped");
                }
                Err(e) => return Err(StorageError::from(e)),
            }
        }

        self.operator.check().await.map_err(|e| {
            StorageError::configuration(format!(
                "container '{}' is not usable: {e}",
                self.bucket()
            ))
        })?;

        info!(
            provider = self.provider_name(),
            bucket = self.bucket(),
            "Storage container ready"
        );
        Ok(())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Build an unsigned link for providers that cannot presign.
    fn public_url(&self, key: &str) -> Option<String> {
        self.config
            .public_base_url
            .as_deref()
            .map(|base| format!("{}/{key}", base.trim_end_matches('/')))
    }
}

impl ObjectStore for StorageService {
    async fn upload(
        &self,
        content: Bytes,
        size: u64,
        mime_type: &str,
        key: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;

        let actual = u64::try_from(content.len()).unwrap_or(u64::MAX);
        if actual != size {
            return Err(StorageError::SizeMismatch {
                key: key.to_string(),
                declared: size,
                actual,
            });
        }

        self.operator
            .write_with(key, content)
            .content_type(mime_type)
            .await
            .map_err(|e| StorageError::write(key, e))?;

        // The object is only handed out together with a usable link.
        let url = match self.presigned_url(key, self.config.presign_ttl_secs).await {
            Ok(url) => url,
            Err(err) => {
                if let Err(cleanup) = self.operator.delete(key).await {
                    warn!(key, error = %cleanup, "Failed to remove object after presign failure");
                }
                return Err(err);
            }
        };

        debug!(key, size, mime_type, "Object stored");
        Ok(StoredObject {
            key: key.to_string(),
            url,
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;

        match self.operator.stat(key).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::not_found(key));
            }
            Err(e) => return Err(StorageError::unavailable(format!("stat '{key}': {e}"))),
        }

        self.operator.delete(key).await.map_err(StorageError::from)?;
        debug!(key, "Object deleted");
        Ok(())
    }

    async fn presigned_url(&self, key: &str, expires_in_secs: u64) -> Result<String, StorageError> {
        if expires_in_secs == 0 {
            return Err(StorageError::InvalidExpiry(expires_in_secs));
        }
        validate_key(key)?;

        match self
            .operator
            .presign_read(key, Duration::from_secs(expires_in_secs))
            .await
        {
            Ok(presigned) => Ok(presigned.uri().to_string()),
            Err(e) if e.kind() == ErrorKind::Unsupported => self
                .public_url(key)
                .ok_or(StorageError::PresignNotSupported),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    fn list(&self, prefix: &str) -> ObjectStream {
        let operator = self.operator.clone();
        let root = listing_root(prefix).to_string();
        let prefix = prefix.to_string();

        // One level under the root; only subtrees matching the prefix are
        // walked further.
        let top = {
            let operator = operator.clone();
            let root = root.clone();
            stream::once(async move { operator.lister(&root).await })
                .map_err(StorageError::from)
                .map_ok(|lister| lister.map_err(StorageError::from))
                .try_flatten()
        };

        let expand = {
            let operator = operator.clone();
            move |entry: Entry| -> BoxStream<'static, Result<Entry, StorageError>> {
                if entry.metadata().is_dir() {
                    let operator = operator.clone();
                    let dir = entry.path().to_string();
                    stream::once(async move { operator.lister_with(&dir).recursive(true).await })
                        .map_err(StorageError::from)
                        .map_ok(|lister| lister.map_err(StorageError::from))
                        .try_flatten()
                        .boxed()
                } else {
                    stream::once(future::ready(Ok(entry))).boxed()
                }
            }
        };

        top.try_filter(move |entry| {
            let path = entry.path();
            future::ready(path != root && path != "/" && path.starts_with(prefix.as_str()))
        })
        .map_ok(expand)
        .try_flatten()
        .try_filter(|entry| future::ready(!entry.metadata().is_dir()))
        .try_filter_map(move |entry| {
            let operator = operator.clone();
            async move {
                // S3 listings carry size and mtime together; other backends
                // only report the entry mode and need a stat.
                if entry.metadata().last_modified().is_some() {
                    return Ok(Some(object_info(entry.path(), entry.metadata())));
                }
                match operator.stat(entry.path()).await {
                    Ok(meta) => Ok(Some(object_info(entry.path(), &meta))),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(StorageError::from(e)),
                }
            }
        })
        .boxed()
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::unavailable(format!("stat '{key}': {e}"))),
        }
    }
}

/// Directory to list so that every key starting with `prefix` is reached.
fn listing_root(prefix: &str) -> &str {
    prefix.rfind('/').map_or("", |i| &prefix[..=i])
}

fn object_info(path: &str, meta: &Metadata) -> ObjectInfo {
    ObjectInfo {
        key: path.to_string(),
        size: meta.content_length(),
        last_modified: meta
            .last_modified()
            .map(|t| DateTime::<Utc>::from(SystemTime::from(t))),
    }
}
