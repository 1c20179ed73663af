//! Bucket provisioning for S3-compatible stores.
//!
//! OpenDAL addresses objects inside an existing bucket and has no way to
//! create one, so startup goes through the S3 API directly.

use std::future::Future;

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::{debug, info};

use super::error::StorageError;

/// Region that rejects an explicit location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// Outcome of a bucket creation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    /// The bucket was created by this call.
    Created,
    /// Someone (possibly this process, earlier) already created it.
    AlreadyExists,
}

/// Bucket-level administration of an object store.
pub trait BucketAdmin: Send + Sync {
    /// Whether the bucket exists and is reachable with our credentials.
    fn bucket_exists(&self, bucket: &str) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Create the bucket.
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> impl Future<Output = Result<BucketCreation, StorageError>> + Send;
}

/// Create `bucket` unless it already exists.
///
/// Concurrent starters racing on the same bucket all succeed.
pub async fn ensure_bucket<A: BucketAdmin>(admin: &A, bucket: &str) -> Result<(), StorageError> {
    if admin.bucket_exists(bucket).await? {
        debug!(bucket, "Bucket already present");
        return Ok(());
    }

    match admin.create_bucket(bucket).await? {
        BucketCreation::Created => info!(bucket, "Bucket created"),
        BucketCreation::AlreadyExists => debug!(bucket, "Bucket created concurrently"),
    }
    Ok(())
}

/// [`BucketAdmin`] backed by the AWS S3 SDK.
#[derive(Debug, Clone)]
pub struct S3BucketAdmin {
    client: Client,
    region: String,
}

impl S3BucketAdmin {
    /// Build a client with static credentials and path-style addressing,
    /// which MinIO and most S3-compatible services require.
    #[must_use]
    pub fn new(endpoint: &str, access_key_id: &str, secret_access_key: &str, region: &str) -> Self {
        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "filegate");
        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(config),
            region: region.to_string(),
        }
    }
}

impl BucketAdmin for S3BucketAdmin {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::unavailable(format!(
                        "head bucket '{bucket}': {service_err}"
                    )))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<BucketCreation, StorageError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(BucketCreation::Created),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_bucket_already_owned_by_you()
                    || service_err.is_bucket_already_exists()
                {
                    Ok(BucketCreation::AlreadyExists)
                } else {
                    Err(StorageError::configuration(format!(
                        "cannot create bucket '{bucket}': {service_err}"
                    )))
                }
            }
        }
    }
}
