//! Service configuration
//!
//! Loaded from an optional JSON file where every field has a default, then
//! overridden from the command line or environment by the CLI.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{AuthError, TokenVerifier};
use crate::http_server::HttpServerConfig;
use crate::object_store::S3Config;
use crate::observability::LogConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Public key material for bearer-token verification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path to a PEM-encoded RSA public key
    #[serde(default)]
    pub public_key_path: Option<PathBuf>,

    /// PEM-encoded RSA public key, used when no path is set
    #[serde(default)]
    pub public_key_pem: Option<String>,
}

impl AuthConfig {
    pub fn has_key_material(&self) -> bool {
        self.public_key_path.is_some()
            || self
                .public_key_pem
                .as_deref()
                .is_some_and(|pem| !pem.trim().is_empty())
    }

    /// Load the verifier; a missing or malformed key is fatal
    pub fn load_verifier(&self) -> Result<TokenVerifier, AuthError> {
        if let Some(path) = &self.public_key_path {
            return TokenVerifier::from_file(path);
        }
        match &self.public_key_pem {
            Some(pem) => TokenVerifier::from_rsa_pem(pem.as_bytes()),
            None => Err(AuthError::InvalidPublicKey("no public key configured".into())),
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub http: HttpServerConfig,

    #[serde(default)]
    pub object_store: S3Config,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl ServiceConfig {
    /// Read a JSON config file. Not validated; overrides come first.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let store = &self.object_store;
        if store.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("object_store.endpoint is required".into()));
        }
        if store.access_key.is_empty() || store.secret_key.is_empty() {
            return Err(ConfigError::Invalid(
                "object_store.access_key and object_store.secret_key are required".into(),
            ));
        }
        if store.get_timeout_secs == 0 || store.list_timeout_secs == 0 || store.upload_timeout_secs == 0 {
            return Err(ConfigError::Invalid("object store timeouts must be > 0".into()));
        }

        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.request_timeout_secs must be > 0".into()));
        }
        if self.http.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("http.max_upload_bytes must be > 0".into()));
        }
        if self.http.concurrency_limit == 0 {
            return Err(ConfigError::Invalid("http.concurrency_limit must be > 0".into()));
        }

        if !self.auth.has_key_material() {
            return Err(ConfigError::Invalid(
                "auth.public_key_path or auth.public_key_pem is required".into(),
            ));
        }

        Ok(())
    }
}
