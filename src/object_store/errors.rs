//! # Object Store Errors

use std::time::Duration;

use thiserror::Error;

/// Result type for object store calls
pub type ObjectStoreResult<T> = Result<T, ObjectStoreError>;

/// Failures reported by an object store client
#[derive(Debug, Clone, Error)]
pub enum ObjectStoreError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Bucket already exists: {0}")]
    BucketAlreadyExists(String),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("I/O error: {0}")]
    IoError(String),

    /// Transport or service-side failure
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ObjectStoreError {
    pub fn object_not_found(bucket: &str, key: &str) -> Self {
        ObjectStoreError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ObjectStoreError::ObjectNotFound { .. } | ObjectStoreError::BucketNotFound(_)
        )
    }
}

impl From<std::io::Error> for ObjectStoreError {
    fn from(e: std::io::Error) -> Self {
        ObjectStoreError::IoError(e.to_string())
    }
}
