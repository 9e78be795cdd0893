//! Shared handler state

use std::sync::Arc;

use crate::auth::AuthGate;
use crate::file_storage::FileService;
use crate::observability::MetricsRegistry;

/// State handed to every route and middleware
#[derive(Debug, Clone)]
pub struct AppState {
    pub files: FileService,
    pub gate: AuthGate,
    pub metrics: Arc<MetricsRegistry>,
    pub version: String,
}

impl AppState {
    pub fn new(files: FileService, gate: AuthGate, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            files,
            gate,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}
