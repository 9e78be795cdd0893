//! # media-storage
//!
//! Attachment gateway for a note-taking application. Files are stored
//! content-addressed in one object store bucket per note; every operation is
//! gated by an RSA-signed bearer token.
//!
//! - [`object_store`] - minimal object store contract, S3 and in-memory stores
//! - [`file_storage`] - `File` model, bucket-per-note storage and the service
//! - [`auth`] - token verification and the authentication gate
//! - [`http_server`] - axum routes and middleware
//! - [`observability`] - logging setup and metrics

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod file_storage;
pub mod http_server;
pub mod object_store;
pub mod observability;
