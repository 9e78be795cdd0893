//! Object store wrapper recording per-operation latency and failures

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::client::{ObjectInfo, ObjectStore, PutObject, StoredObject};
use super::errors::ObjectStoreResult;
use crate::observability::MetricsRegistry;

/// Wraps any [`ObjectStore`] and reports each call to a [`MetricsRegistry`]
#[derive(Debug)]
pub struct MeteredObjectStore<S> {
    inner: S,
    metrics: Arc<MetricsRegistry>,
}

impl<S: ObjectStore> MeteredObjectStore<S> {
    pub fn new(inner: S, metrics: Arc<MetricsRegistry>) -> Self {
        Self { inner, metrics }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn observe<T, F>(&self, operation: &'static str, call: F) -> ObjectStoreResult<T>
    where
        F: std::future::Future<Output = ObjectStoreResult<T>>,
    {
        let start = Instant::now();
        let result = call.await;
        self.metrics
            .record_store_call(operation, start.elapsed(), result.is_err());
        result
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for MeteredObjectStore<S> {
    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<StoredObject> {
        self.observe("get_object", self.inner.get_object(bucket, key)).await
    }

    async fn list_objects(&self, bucket: &str) -> ObjectStoreResult<Vec<ObjectInfo>> {
        self.observe("list_objects", self.inner.list_objects(bucket)).await
    }

    async fn bucket_exists(&self, bucket: &str) -> ObjectStoreResult<bool> {
        self.observe("bucket_exists", self.inner.bucket_exists(bucket)).await
    }

    async fn make_bucket(&self, bucket: &str) -> ObjectStoreResult<()> {
        self.observe("make_bucket", self.inner.make_bucket(bucket)).await
    }

    async fn put_object(&self, bucket: &str, key: &str, object: PutObject) -> ObjectStoreResult<()> {
        self.observe("put_object", self.inner.put_object(bucket, key, object)).await
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        self.observe("delete_object", self.inner.delete_object(bucket, key)).await
    }
}
