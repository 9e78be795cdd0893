//! Observability for the storage gateway
//!
//! - Structured logging through `tracing` (JSON or text)
//! - Process-scoped counters and latency histograms exposed in Prometheus
//!   text format
//!
//! The registry is created once at startup and handed to the HTTP layer by
//! `Arc`; nothing here is a process global except the tracing subscriber.

mod logger;
mod metrics;

pub use logger::{init_logging, LogConfig, LogFormat};
pub use metrics::{normalize_path, MetricsRegistry, MetricsSnapshot};
