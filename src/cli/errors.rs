//! CLI-specific error types
//!
//! All CLI errors are fatal: `main` prints them and exits 1.

use std::io;

use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::object_store::ObjectStoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}: {0}", Self::CONFIG)]
    Config(#[from] ConfigError),

    #[error("{}: {0}", Self::KEY)]
    PublicKey(AuthError),

    #[error("{}: {0}", Self::STORE)]
    ObjectStore(#[from] ObjectStoreError),

    #[error("{}: token rejected: {0}", Self::TOKEN)]
    TokenRejected(AuthError),

    #[error("{}: {0}", Self::IO)]
    Io(#[from] io::Error),
}

impl CliError {
    const CONFIG: &'static str = "MEDIA_CLI_CONFIG_ERROR";
    const KEY: &'static str = "MEDIA_CLI_KEY_ERROR";
    const STORE: &'static str = "MEDIA_CLI_STORE_ERROR";
    const TOKEN: &'static str = "MEDIA_CLI_TOKEN_REJECTED";
    const IO: &'static str = "MEDIA_CLI_IO_ERROR";

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => Self::CONFIG,
            Self::PublicKey(_) => Self::KEY,
            Self::ObjectStore(_) => Self::STORE,
            Self::TokenRejected(_) => Self::TOKEN,
            Self::Io(_) => Self::IO,
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
