//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// The store rejected a write.
    #[error("failed to write object '{key}': {message}")]
    Write {
        /// Storage key being written.
        key: String,
        /// Underlying failure.
        message: String,
    },

    /// Declared size disagrees with the content handed over.
    #[error("size mismatch for '{key}': declared {declared} bytes, got {actual}")]
    SizeMismatch {
        /// Storage key being written.
        key: String,
        /// Size the caller declared.
        declared: u64,
        /// Length of the content.
        actual: u64,
    },

    /// Store state could not be determined.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Presigned URLs need a positive lifetime.
    #[error("presigned URL expiry must be greater than zero, got {0}")]
    InvalidExpiry(u64),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a write error.
    #[must_use]
    pub fn write(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Write {
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether this error means the object is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}
