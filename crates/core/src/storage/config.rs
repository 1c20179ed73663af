//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use filegate_shared::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: MinIO, Cloudflare R2, AWS S3
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// In-process memory; contents vanish with the process.
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (MinIO, Cloudflare R2, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::LocalFs { .. } => "fs",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Default presigned download URL TTL in seconds (default: 86400 = 24 hours).
    pub presign_ttl_secs: u64,
    /// Base URL used for object links when the provider cannot presign.
    ///
    /// Links built this way are not time-bounded.
    pub public_base_url: Option<String>,
}

impl StorageConfig {
    /// Default download TTL: 24 hours.
    pub const DEFAULT_PRESIGN_TTL: u64 = 86_400;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            presign_ttl_secs: Self::DEFAULT_PRESIGN_TTL,
            public_base_url: None,
        }
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_presign_ttl(mut self, secs: u64) -> Self {
        self.presign_ttl_secs = secs;
        self
    }

    /// Set the fallback base URL for providers without presign support.
    #[must_use]
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }
}

impl TryFrom<&StorageSettings> for StorageConfig {
    type Error = StorageError;

    fn try_from(settings: &StorageSettings) -> Result<Self, Self::Error> {
        let provider = match settings.provider.as_str() {
            "s3" | "minio" => StorageProvider::s3(
                &settings.endpoint,
                &settings.bucket,
                &settings.access_key_id,
                &settings.secret_access_key,
                &settings.region,
            ),
            "fs" | "local" => StorageProvider::local_fs(&settings.root),
            "memory" => StorageProvider::Memory,
            other => {
                return Err(StorageError::configuration(format!(
                    "unknown storage provider '{other}'"
                )));
            }
        };

        if settings.presign_ttl_secs == 0 {
            return Err(StorageError::InvalidExpiry(0));
        }

        let mut config = Self::new(provider).with_presign_ttl(settings.presign_ttl_secs);
        config.public_base_url = settings.public_base_url.clone();
        Ok(config)
    }
}
