//! CLI module
//!
//! - serve: load config, wire the object store, file service and auth gate,
//!   then run the HTTP server
//! - verify-token: operator check of a bearer token against a public key

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, ServeArgs};
pub use commands::{resolve_config, run_command, serve, verify_token};
pub use errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub async fn run() -> CliResult<()> {
    run_command(Cli::parse_args()).await
}
