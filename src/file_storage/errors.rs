//! # File Storage Errors

use thiserror::Error;

use crate::errors::ErrorKind;
use crate::object_store::ObjectStoreError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Reserved: uploads overwrite rather than conflict
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Failed to {operation}: {source}")]
    ObjectStore {
        operation: &'static str,
        #[source]
        source: ObjectStoreError,
    },
}

impl StorageError {
    /// Wrap a store failure with the operation that hit it
    pub fn object_store(operation: &'static str, source: ObjectStoreError) -> Self {
        StorageError::ObjectStore { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::MissingParameter(_) => ErrorKind::Validation,
            StorageError::NotFound(_) => ErrorKind::NotFound,
            StorageError::AlreadyExists(_) => ErrorKind::Conflict,
            StorageError::IoError(_) => ErrorKind::System,
            StorageError::ObjectStore { .. } => ErrorKind::System,
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// True when the store reported the object or bucket as missing.
    ///
    /// Single-object lookups stay `System` errors; the boundary may use this
    /// to translate them into a not-found answer.
    pub fn is_missing_object(&self) -> bool {
        match self {
            StorageError::ObjectStore { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::IoError(e.to_string())
    }
}
