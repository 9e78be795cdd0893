//! # File Model
//!
//! A stored file is addressed by a digest of its display name and content,
//! so identical uploads always land on the same object key.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::errors::{StorageError, StorageResult};

/// A file attached to a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Content-addressed identifier, also the object key
    pub id: String,
    /// Caller-supplied display name, not unique
    pub name: String,
    /// Size in bytes as declared by the uploader
    pub size: u64,
    pub bytes: Bytes,
}

/// Raw upload as received from the caller
#[derive(Debug)]
pub struct NewFile<R> {
    pub name: String,
    pub size: u64,
    pub reader: R,
}

impl<R> NewFile<R> {
    pub fn new(name: impl Into<String>, size: u64, reader: R) -> Self {
        Self {
            name: name.into(),
            size,
            reader,
        }
    }
}

impl File {
    /// Derive the identifier for a (name, content) pair.
    ///
    /// URL-safe padded base64 of SHA-256 over the name bytes followed by the
    /// content bytes.
    pub fn derive_id(name: &str, content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(name.as_bytes());
        hasher.update(content);
        URL_SAFE.encode(hasher.finalize())
    }

    /// Build a file from fully materialized content
    pub fn derive(name: impl Into<String>, size: u64, content: Bytes) -> Self {
        let name = name.into();
        Self {
            id: Self::derive_id(&name, &content),
            name,
            size,
            bytes: content,
        }
    }

    /// Drain an upload stream and derive the file from its content
    pub async fn from_upload<R>(upload: NewFile<R>) -> StorageResult<Self>
    where
        R: AsyncRead + Unpin,
    {
        let NewFile {
            name,
            size,
            mut reader,
        } = upload;

        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .await
            .map_err(|e| StorageError::IoError(format!("failed to read upload: {}", e)))?;

        Ok(Self::derive(name, size, Bytes::from(content)))
    }
}
