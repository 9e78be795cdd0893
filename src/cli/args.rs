//! CLI argument definitions using clap
//!
//! Commands:
//! - media-storage serve [--config <path>] [overrides]
//! - media-storage verify-token --public-key <path> <token>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ServiceConfig;
use crate::observability::LogFormat;

/// Note attachment storage gateway
#[derive(Parser, Debug)]
#[command(name = "media-storage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Verify a bearer token and print its subject
    VerifyToken {
        /// Path to the PEM-encoded RSA public key
        #[arg(long)]
        public_key: PathBuf,

        /// Token, without the `Bearer` prefix
        token: String,
    },
}

/// Overrides applied on top of the config file
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to JSON configuration file
    #[arg(long, env = "MEDIA_STORAGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "MEDIA_STORAGE_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "MEDIA_STORAGE_PORT")]
    pub port: Option<u16>,

    /// Object store endpoint, e.g. `localhost:9000`
    #[arg(long, env = "MINIO_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "MINIO_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    #[arg(long, env = "MINIO_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Path to the PEM-encoded RSA public key
    #[arg(long, env = "PUBLIC_SIGNING_KEY_FILE")]
    pub public_key: Option<PathBuf>,

    /// PEM-encoded RSA public key
    #[arg(long, env = "PUBLIC_SIGNING_KEY", hide_env_values = true)]
    pub public_key_pem: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl ServeArgs {
    /// Overlay every given flag onto the loaded config
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.http.host = host.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(endpoint) = &self.endpoint {
            config.object_store.endpoint = endpoint.clone();
        }
        if let Some(access_key) = &self.access_key {
            config.object_store.access_key = access_key.clone();
        }
        if let Some(secret_key) = &self.secret_key {
            config.object_store.secret_key = secret_key.clone();
        }
        if let Some(path) = &self.public_key {
            config.auth.public_key_path = Some(path.clone());
        }
        if let Some(pem) = &self.public_key_pem {
            config.auth.public_key_pem = Some(pem.clone());
        }
        if self.verbose {
            config.log.verbose = true;
        }
        if let Some(format) = self.log_format {
            config.log.format = format;
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
