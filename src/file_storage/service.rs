//! # File Service
//!
//! Request-shaping layer in front of a [`FileStorage`]. Turns raw uploads into
//! content-addressed files and otherwise delegates.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::debug;

use super::backend::FileStorage;
use super::errors::{StorageError, StorageResult};
use super::file::{File, NewFile};
use crate::auth::CallerIdentity;

/// File service for note attachments
#[derive(Debug, Clone)]
pub struct FileService {
    storage: Arc<dyn FileStorage>,
}

fn require(value: &str, parameter: &'static str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::MissingParameter(parameter));
    }
    Ok(())
}

impl FileService {
    pub fn new(storage: Arc<dyn FileStorage>) -> Self {
        Self { storage }
    }

    /// Fetch one file of a note.
    ///
    /// The caller is only recorded; any authenticated caller may read any note.
    pub async fn get_file(
        &self,
        caller: &CallerIdentity,
        note_id: &str,
        file_id: &str,
    ) -> StorageResult<File> {
        require(note_id, "note_uuid")?;
        require(file_id, "id")?;
        debug!(subject = caller.subject(), note_id, file_id, "get file");

        self.storage.get_file(note_id, file_id).await
    }

    /// Fetch all readable files of a note
    pub async fn list_files(&self, caller: &CallerIdentity, note_id: &str) -> StorageResult<Vec<File>> {
        require(note_id, "note_uuid")?;
        debug!(subject = caller.subject(), note_id, "list files");

        self.storage.list_files(note_id).await
    }

    /// Drain an upload, derive its identifier and persist it
    pub async fn create_file<R>(
        &self,
        caller: &CallerIdentity,
        note_id: &str,
        upload: NewFile<R>,
    ) -> StorageResult<File>
    where
        R: AsyncRead + Unpin + Send,
    {
        require(note_id, "note_uuid")?;

        let file = File::from_upload(upload).await?;
        debug!(
            subject = caller.subject(),
            note_id,
            file_id = %file.id,
            name = %file.name,
            size = file.size,
            "create file"
        );

        self.storage.create_file(note_id, &file).await?;
        Ok(file)
    }

    pub async fn delete_file(
        &self,
        caller: &CallerIdentity,
        note_id: &str,
        file_id: &str,
    ) -> StorageResult<()> {
        require(note_id, "note_uuid")?;
        require(file_id, "id")?;
        debug!(subject = caller.subject(), note_id, file_id, "delete file");

        self.storage.delete_file(note_id, file_id).await
    }
}
