//! # Object Store Client
//!
//! Thin boundary around a bucketed key/value-with-metadata service. The
//! network variant talks to any S3-compatible endpoint; the in-memory variant
//! backs tests.

pub mod errors;
pub mod client;
pub mod memory;
pub mod metered;
pub mod s3;

pub use errors::{ObjectStoreError, ObjectStoreResult};
pub use client::{
    with_timeout, ObjectBody, ObjectInfo, ObjectStore, PutObject, StoredObject,
    BINARY_CONTENT_TYPE, NAME_METADATA_KEY,
};
pub use memory::{MemoryObjectStore, ObjectFault};
pub use metered::MeteredObjectStore;
pub use s3::{S3Config, S3ObjectStore};
