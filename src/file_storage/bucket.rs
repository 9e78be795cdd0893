//! # Bucket-per-Note Storage
//!
//! Maps each note to one object store bucket and each file to one object
//! keyed by the file identifier. The display name travels as object metadata.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::backend::FileStorage;
use super::errors::{StorageError, StorageResult};
use super::file::File;
use crate::object_store::{
    ObjectBody, ObjectStore, ObjectStoreError, PutObject, StoredObject, BINARY_CONTENT_TYPE,
};

/// File storage over any object store
#[derive(Debug)]
pub struct BucketFileStorage<S> {
    store: S,
}

impl<S: ObjectStore> BucketFileStorage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying object store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure the note's bucket exists.
    ///
    /// A failed existence check falls through to creation, and losing the
    /// creation race to a concurrent upload counts as success.
    async fn ensure_bucket(&self, note_id: &str) -> StorageResult<()> {
        match self.store.bucket_exists(note_id).await {
            Ok(true) => return Ok(()),
            Ok(false) => warn!(bucket = note_id, "no bucket, creating new one"),
            Err(e) => warn!(
                bucket = note_id,
                error = %e,
                "bucket existence check failed, creating new one"
            ),
        }

        match self.store.make_bucket(note_id).await {
            Ok(()) => Ok(()),
            Err(ObjectStoreError::BucketAlreadyExists(_)) => {
                debug!(bucket = note_id, "bucket created concurrently");
                Ok(())
            }
            Err(e) => Err(StorageError::object_store("create bucket", e)),
        }
    }
}

/// Read an object body up to its declared size.
///
/// Hitting end-of-stream before the declared size is not an error.
async fn read_declared(body: ObjectBody, size: u64) -> std::io::Result<Bytes> {
    let mut buffer = Vec::new();
    body.take(size).read_to_end(&mut buffer).await?;
    Ok(Bytes::from(buffer))
}

async fn into_file(object: StoredObject, fallback_name: Option<&str>) -> std::io::Result<File> {
    let StoredObject { info, body } = object;
    let bytes = read_declared(body, info.size).await?;
    let name = info
        .display_name()
        .or(fallback_name)
        .unwrap_or_default()
        .to_string();

    Ok(File {
        id: info.key,
        name,
        size: info.size,
        bytes,
    })
}

#[async_trait]
impl<S: ObjectStore> FileStorage for BucketFileStorage<S> {
    async fn get_file(&self, note_id: &str, file_id: &str) -> StorageResult<File> {
        let object = self
            .store
            .get_object(note_id, file_id)
            .await
            .map_err(|e| StorageError::object_store("get file", e))?;

        into_file(object, None)
            .await
            .map_err(|e| StorageError::object_store("get file", e.into()))
    }

    async fn list_files(&self, note_id: &str) -> StorageResult<Vec<File>> {
        let listing = self
            .store
            .list_objects(note_id)
            .await
            .map_err(|e| StorageError::object_store("list files", e))?;

        if listing.is_empty() {
            return Err(StorageError::NotFound(format!("no files for note {}", note_id)));
        }

        let mut files = Vec::with_capacity(listing.len());
        for entry in listing {
            let object = match self.store.get_object(note_id, &entry.key).await {
                Ok(object) => object,
                Err(e) => {
                    warn!(bucket = note_id, key = %entry.key, error = %e, "failed to get object, skipping");
                    continue;
                }
            };

            match into_file(object, entry.display_name()).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(bucket = note_id, key = %entry.key, error = %e, "failed to read object, skipping");
                }
            }
        }

        Ok(files)
    }

    async fn create_file(&self, note_id: &str, file: &File) -> StorageResult<()> {
        self.ensure_bucket(note_id).await?;

        debug!(bucket = note_id, key = %file.id, name = %file.name, "put new object");
        self.store
            .put_object(
                note_id,
                &file.id,
                PutObject {
                    name: file.name.clone(),
                    size: file.size,
                    content_type: BINARY_CONTENT_TYPE,
                    body: file.bytes.clone(),
                },
            )
            .await
            .map_err(|e| StorageError::object_store("upload file", e))
    }

    async fn delete_file(&self, note_id: &str, file_id: &str) -> StorageResult<()> {
        self.store
            .delete_object(note_id, file_id)
            .await
            .map_err(|e| StorageError::object_store("delete file", e))
    }
}
