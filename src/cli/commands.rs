//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::args::{Cli, Command, ServeArgs};
use super::errors::{CliError, CliResult};
use crate::auth::{AuthGate, TokenVerifier};
use crate::config::ServiceConfig;
use crate::file_storage::{BucketFileStorage, FileService};
use crate::http_server::{AppState, HttpServer};
use crate::object_store::{MeteredObjectStore, S3ObjectStore};
use crate::observability::{init_logging, MetricsRegistry};

/// Run the CLI with parsed arguments
pub async fn run_command(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::VerifyToken { public_key, token } => {
            let subject = verify_token(&public_key, &token)?;
            println!("{}", subject);
            Ok(())
        }
    }
}

/// Resolve the effective config: file, then flags and environment
pub fn resolve_config(args: &ServeArgs) -> CliResult<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

/// Serve until a shutdown signal arrives
pub async fn serve(args: ServeArgs) -> CliResult<()> {
    let config = resolve_config(&args)?;
    init_logging(&config.log);

    let verifier = config.auth.load_verifier().map_err(CliError::PublicKey)?;
    let store = S3ObjectStore::new(&config.object_store)?;
    info!(endpoint = %config.object_store.endpoint, "object store client ready");

    let metrics = Arc::new(MetricsRegistry::new());
    let store = MeteredObjectStore::new(store, metrics.clone());
    let files = FileService::new(Arc::new(BucketFileStorage::new(store)));
    let state = AppState::new(files, AuthGate::new(verifier), metrics);

    HttpServer::new(config.http, state).start().await?;
    Ok(())
}

/// Verify a token against a public key file and return its subject
pub fn verify_token(public_key: &Path, token: &str) -> CliResult<String> {
    let verifier = TokenVerifier::from_file(public_key).map_err(CliError::PublicKey)?;
    let caller = verifier.verify(token).map_err(CliError::TokenRejected)?;
    Ok(caller.subject().to_string())
}
