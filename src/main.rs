//! media-storage entry point
//!
//! Parses arguments and dispatches through `cli::run`; prints errors to
//! stderr and exits non-zero on failure.

use media_storage::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
