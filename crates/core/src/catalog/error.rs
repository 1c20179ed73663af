//! Catalog error types.

use thiserror::Error;

use filegate_shared::{AppError, FileId};

use crate::storage::StorageError;

/// Catalog operation errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Rejected input; nothing was touched.
    #[error("validation failed: {0}")]
    Validation(String),

    /// File record not found.
    #[error("file not found: {0}")]
    NotFound(FileId),

    /// A record with this id already exists.
    #[error("duplicate file id: {0}")]
    DuplicateId(FileId),

    /// Another record already owns this storage key.
    #[error("duplicate storage key: {0}")]
    DuplicateStorageKey(String),

    /// File too large.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type not accepted.
    #[error("MIME type '{0}' is not allowed")]
    InvalidMimeType(String),

    /// Writing the object failed; no record was created.
    #[error("upload of '{key}' failed: {source}")]
    UploadFailed {
        /// Storage key that was being written.
        key: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Deleting the object failed; the record was kept.
    #[error("delete of file {id} (object '{key}') failed: {source}")]
    DeleteFailed {
        /// File being deleted.
        id: FileId,
        /// Its storage key.
        key: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Storage could not tell whether the object exists; the record was kept.
    #[error("storage unavailable for file {id} (object '{key}'): {source}")]
    StorageUnavailable {
        /// File being operated on.
        id: FileId,
        /// Its storage key.
        key: String,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// Other storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Record store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl CatalogError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(id: FileId) -> Self {
        Self::NotFound(id)
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let message = err.to_string();
        match err {
            CatalogError::Validation(_) => Self::Validation(message),
            CatalogError::NotFound(_) => Self::NotFound(message),
            CatalogError::DuplicateId(_) | CatalogError::DuplicateStorageKey(_) => {
                Self::Conflict(message)
            }
            CatalogError::FileTooLarge { .. } => Self::PayloadTooLarge(message),
            CatalogError::InvalidMimeType(_) => Self::UnsupportedMediaType(message),
            CatalogError::UploadFailed { .. } | CatalogError::DeleteFailed { .. } => {
                Self::ExternalService(message)
            }
            CatalogError::StorageUnavailable { .. } => Self::ServiceUnavailable(message),
            CatalogError::Storage(source) => match source {
                StorageError::NotFound { .. } => Self::NotFound(message),
                StorageError::InvalidExpiry(_)
                | StorageError::InvalidKey(_)
                | StorageError::SizeMismatch { .. } => Self::Validation(message),
                StorageError::Unavailable(_) => Self::ServiceUnavailable(message),
                StorageError::Configuration(_) => Self::Internal(message),
                StorageError::Write { .. }
                | StorageError::PresignNotSupported
                | StorageError::Operation(_) => Self::ExternalService(message),
            },
            CatalogError::Repository(_) => Self::Database(message),
        }
    }
}
