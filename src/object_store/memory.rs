//! # In-Memory Object Store
//!
//! Deterministic stand-in for the network store, used by tests and local
//! development. Faults can be injected per object to exercise the
//! partial-failure paths of the file storage layer.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::pin::Pin;
use std::sync::RwLock;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, ReadBuf};

use super::client::{ObjectInfo, ObjectStore, PutObject, StoredObject, NAME_METADATA_KEY};
use super::errors::{ObjectStoreError, ObjectStoreResult};

/// Failure to simulate when an object is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectFault {
    /// Opening the object fails outright
    Unavailable,
    /// Opening succeeds but reading the content fails
    Unreadable,
}

#[derive(Debug, Clone)]
struct MemoryObject {
    info: ObjectInfo,
    content_type: String,
    data: Bytes,
    fault: Option<ObjectFault>,
}

type Buckets = HashMap<String, BTreeMap<String, MemoryObject>>;

/// `HashMap`-backed object store
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<Buckets>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent opens of `bucket/key` fail with the given fault
    pub fn inject_fault(&self, bucket: &str, key: &str, fault: ObjectFault) -> ObjectStoreResult<()> {
        let mut buckets = self.write_buckets()?;
        let object = buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
            .ok_or_else(|| ObjectStoreError::object_not_found(bucket, key))?;
        object.fault = Some(fault);
        Ok(())
    }

    /// Number of objects in a bucket, `None` if the bucket does not exist
    pub fn object_count(&self, bucket: &str) -> Option<usize> {
        self.buckets
            .read()
            .ok()
            .and_then(|buckets| buckets.get(bucket).map(|objects| objects.len()))
    }

    /// Content type recorded for an object
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.buckets.read().ok().and_then(|buckets| {
            buckets
                .get(bucket)
                .and_then(|objects| objects.get(key))
                .map(|object| object.content_type.clone())
        })
    }

    fn read_buckets(&self) -> ObjectStoreResult<std::sync::RwLockReadGuard<'_, Buckets>> {
        self.buckets
            .read()
            .map_err(|_| ObjectStoreError::Request("Lock poisoned".into()))
    }

    fn write_buckets(&self) -> ObjectStoreResult<std::sync::RwLockWriteGuard<'_, Buckets>> {
        self.buckets
            .write()
            .map_err(|_| ObjectStoreError::Request("Lock poisoned".into()))
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<StoredObject> {
        let buckets = self.read_buckets()?;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;
        let object = objects
            .get(key)
            .ok_or_else(|| ObjectStoreError::object_not_found(bucket, key))?;

        match object.fault {
            Some(ObjectFault::Unavailable) => Err(ObjectStoreError::Request(format!(
                "object {}/{} is unavailable",
                bucket, key
            ))),
            Some(ObjectFault::Unreadable) => Ok(StoredObject {
                info: object.info.clone(),
                body: Box::pin(UnreadableBody),
            }),
            None => Ok(StoredObject {
                info: object.info.clone(),
                body: Box::pin(io::Cursor::new(object.data.clone())),
            }),
        }
    }

    async fn list_objects(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectInfo>> {
        let buckets = self.read_buckets()?;
        Ok(buckets
            .get(bucket)
            .map(|objects| objects.values().map(|o| o.info.clone()).collect())
            .unwrap_or_default())
    }

    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool> {
        Ok(self.read_buckets()?.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str) -> ObjectStoreResult<()> {
        let mut buckets = self.write_buckets()?;
        if buckets.contains_key(bucket) {
            return Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> ObjectStoreResult<()> {
        let mut buckets = self.write_buckets()?;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;

        let mut metadata = HashMap::new();
        metadata.insert(NAME_METADATA_KEY.to_string(), object.name);

        objects.insert(
            key.to_string(),
            MemoryObject {
                info: ObjectInfo {
                    key: key.to_string(),
                    size: object.body.len() as u64,
                    metadata,
                },
                content_type: object.content_type.to_string(),
                data: object.body,
                fault: None,
            },
        );
        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        let mut buckets = self.write_buckets()?;
        if let Some(objects) = buckets.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}

/// Body whose every read fails
struct UnreadableBody;

impl AsyncRead for UnreadableBody {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "object content is corrupted",
        )))
    }
}
