//! # Object Store Client Trait

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

use super::errors::{ObjectStoreError, ObjectStoreResult};

/// Readable body of a stored object
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// Metadata key holding the display name of a stored file
pub const NAME_METADATA_KEY: &str = "Name";

/// Content type recorded for every uploaded object
pub const BINARY_CONTENT_TYPE: &str = "application/octet-stream";

/// Listing / stat information for a stored object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub metadata: HashMap<String, String>,
}

impl ObjectInfo {
    /// Look up a user metadata value.
    ///
    /// Keys are matched case-insensitively: S3 lowercases user metadata on the
    /// way back, so `Name` is returned as `name`.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Display name recorded at upload time
    pub fn display_name(&self) -> Option<&str> {
        self.metadata_value(NAME_METADATA_KEY)
    }
}

/// An opened object: stat information plus its content stream
pub struct StoredObject {
    pub info: ObjectInfo,
    pub body: ObjectBody,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Object write request
#[derive(Debug, Clone)]
pub struct PutObject {
    /// Display name, stored as `Name` user metadata
    pub name: String,
    /// Size declared by the uploader. Logged only; stores record `body.len()`.
    pub size: u64,
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Network-facing client for a bucketed object store.
///
/// Implementations must be safe to call concurrently from many requests.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
    /// Open a single object
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<StoredObject>;

    /// List every object in a bucket. A missing bucket lists as empty.
    async fn list_objects(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectInfo>>;

    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool>;

    /// Create a bucket, failing with `BucketAlreadyExists` if it is already there
    async fn make_bucket(&self, bucket: &str) -> ObjectStoreResult<()>;

    /// Write an object, replacing any existing object under the same key
    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> ObjectStoreResult<()>;

    /// Remove an object. Removing a missing object succeeds.
    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()>;
}

/// Run a store call under a deadline.
///
/// Only the wrapped call is cancelled when the deadline passes.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> ObjectStoreResult<T>
where
    F: Future<Output = ObjectStoreResult<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ObjectStoreError::Timeout { operation, timeout }),
    }
}
