//! # HTTP Server Module
//!
//! Axum front end for the file service.
//!
//! # Endpoints
//!
//! - `/ping`, `/version`, `/metrics` - unauthenticated
//! - `/public/v1/api/files[/:id]` - bearer-token protected attachment API

pub mod config;
pub mod file_routes;
pub mod middleware;
pub mod observability_routes;
pub mod response;
pub mod server;
pub mod state;

pub use config::HttpServerConfig;
pub use server::HttpServer;
pub use state::AppState;
