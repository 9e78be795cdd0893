//! # HTTP Server
//!
//! Combines the routers, applies the middleware stack and serves until a
//! shutdown signal arrives.

use std::io;
use std::net::SocketAddr;

use axum::extract::Request;
use axum::{Router, ServiceExt};
use tokio::net::TcpListener;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::{Layer, ServiceBuilder};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::config::HttpServerConfig;
use super::file_routes::{file_routes, FILES_PATH};
use super::middleware::UuidRequestId;
use super::observability_routes::{not_found_handler, observability_routes};
use super::state::AppState;

/// HTTP server for the attachment gateway
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    fn cors(config: &HttpServerConfig) -> CorsLayer {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if config.cors_origins.is_empty() {
            return layer.allow_origin(Any);
        }

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }

    /// Build the combined router with all endpoints
    fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(CatchPanicLayer::new())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(Self::cors(config))
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::new(config.request_timeout()))
            .layer(GlobalConcurrencyLimitLayer::new(config.concurrency_limit));

        Router::new()
            .merge(observability_routes(state.clone()))
            .merge(file_routes(state, config.max_upload_bytes))
            .fallback(not_found_handler)
            .layer(middleware)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Router wrapped in trailing-slash normalisation, ready to serve
    pub fn service(self) -> NormalizePath<Router> {
        NormalizePathLayer::trim_trailing_slash().layer(self.router)
    }

    /// Serve until SIGINT, SIGTERM, SIGHUP or SIGQUIT
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, files = FILES_PATH, "starting media storage server");

        let app = self.service();
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("server stopped");
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for(kind: tokio::signal::unix::SignalKind) {
    match tokio::signal::unix::signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "failed to install signal handler");
            std::future::pending::<()>().await;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::SignalKind;
        tokio::select! {
            _ = ctrl_c => {},
            _ = wait_for(SignalKind::terminate()) => {},
            _ = wait_for(SignalKind::hangup()) => {},
            _ = wait_for(SignalKind::quit()) => {},
        }
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("shutdown signal received, draining connections");
}
