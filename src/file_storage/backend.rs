//! # File Storage Trait

use async_trait::async_trait;

use super::errors::StorageResult;
use super::file::File;

/// Per-note file storage.
///
/// Every operation is scoped to a note identifier, which names the container
/// holding that note's files.
#[async_trait]
pub trait FileStorage: Send + Sync + std::fmt::Debug {
    /// Fetch a single file
    async fn get_file(&self, note_id: &str, file_id: &str) -> StorageResult<File>;

    /// Fetch every readable file of a note
    async fn list_files(&self, note_id: &str) -> StorageResult<Vec<File>>;

    /// Persist a file, creating the note's container on first use
    async fn create_file(&self, note_id: &str, file: &File) -> StorageResult<()>;

    /// Remove a file
    async fn delete_file(&self, note_id: &str, file_id: &str) -> StorageResult<()>;
}
