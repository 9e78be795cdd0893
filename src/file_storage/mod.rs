//! # File Storage Module
//!
//! Content-addressed note attachments kept in one object store bucket per
//! note.

pub mod errors;
pub mod file;
pub mod backend;
pub mod bucket;
pub mod service;

pub use errors::{StorageError, StorageResult};
pub use file::{File, NewFile};
pub use backend::FileStorage;
pub use bucket::BucketFileStorage;
pub use service::FileService;
