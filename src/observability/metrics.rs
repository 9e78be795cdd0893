//! Metrics registry
//!
//! - Labelled series go through a `metrics` recorder owned by the registry;
//!   it is never installed as the global recorder
//! - Plain totals are mirrored in relaxed atomics for `snapshot()`
//! - Created once at startup and shared by handle

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use serde::Serialize;

/// Histogram buckets in seconds, shared by HTTP and object store latencies
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Process-scoped request and storage metrics
pub struct MetricsRegistry {
    started: Instant,
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    requests_total: AtomicU64,
    responses_2xx: AtomicU64,
    responses_4xx: AtomicU64,
    responses_5xx: AtomicU64,
    auth_rejections: AtomicU64,
    files_uploaded: AtomicU64,
    files_downloaded: AtomicU64,
    files_deleted: AtomicU64,
    listings_served: AtomicU64,
    upload_bytes: AtomicU64,
    download_bytes: AtomicU64,
    store_errors: AtomicU64,
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        let recorder = PrometheusBuilder::new()
            .set_buckets(LATENCY_BUCKETS)
            .unwrap_or_else(|_| PrometheusBuilder::new())
            .build_recorder();
        let handle = recorder.handle();

        let registry = Self {
            started: Instant::now(),
            recorder,
            handle,
            requests_total: AtomicU64::new(0),
            responses_2xx: AtomicU64::new(0),
            responses_4xx: AtomicU64::new(0),
            responses_5xx: AtomicU64::new(0),
            auth_rejections: AtomicU64::new(0),
            files_uploaded: AtomicU64::new(0),
            files_downloaded: AtomicU64::new(0),
            files_deleted: AtomicU64::new(0),
            listings_served: AtomicU64::new(0),
            upload_bytes: AtomicU64::new(0),
            download_bytes: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        };
        registry.describe();
        registry
    }
}

/// Point-in-time copy of the plain totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub requests_total: u64,
    pub responses_2xx: u64,
    pub responses_4xx: u64,
    pub responses_5xx: u64,
    pub auth_rejections: u64,
    pub files_uploaded: u64,
    pub files_downloaded: u64,
    pub files_deleted: u64,
    pub listings_served: u64,
    pub upload_bytes: u64,
    pub download_bytes: u64,
    pub store_errors: u64,
}

/// Replace path segments that are UUIDs with `:uuid`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                ":uuid"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this registry's recorder as the thread-local recorder
    fn with_recorder<F: FnOnce()>(&self, f: F) {
        metrics::with_local_recorder(&self.recorder, f)
    }

    fn describe(&self) {
        self.with_recorder(|| {
            describe_gauge!("http_in_uptime_seconds", Unit::Seconds, "Seconds since the process started");
            describe_counter!("http_in_requests_total", "Incoming HTTP requests by method and route");
            describe_counter!("http_in_responses_total", "HTTP responses by method, route and status code");
            describe_histogram!("http_in_response_time_seconds", Unit::Seconds, "HTTP response latency");
            describe_counter!("http_in_auth_rejections_total", "Requests rejected by the auth gate");
            describe_counter!("object_store_requests_total", "Object store calls by operation");
            describe_counter!("object_store_errors_total", "Failed object store calls by operation");
            describe_histogram!("object_store_request_duration_seconds", Unit::Seconds, "Object store call latency");
            describe_counter!("files_uploaded_total", "Files persisted");
            describe_counter!("files_downloaded_total", "Files returned to callers");
            describe_counter!("files_deleted_total", "Delete operations served");
            describe_counter!("file_listings_total", "Note listings served");
            describe_counter!("file_upload_bytes_total", "Bytes accepted from uploads");
            describe_counter!("file_download_bytes_total", "Bytes returned to callers");
        });
    }

    // HTTP

    /// Record one served request. `route` should already be normalised.
    pub fn record_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let class = match status {
            200..=299 => Some(&self.responses_2xx),
            400..=499 => Some(&self.responses_4xx),
            500..=599 => Some(&self.responses_5xx),
            _ => None,
        };
        if let Some(counter) = class {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        let method = method.to_owned();
        let route = route.to_owned();
        self.with_recorder(|| {
            counter!("http_in_requests_total", "method" => method.clone(), "url" => route.clone())
                .increment(1);
            counter!(
                "http_in_responses_total",
                "method" => method.clone(),
                "url" => route.clone(),
                "code" => status.to_string()
            )
            .increment(1);
            histogram!("http_in_response_time_seconds", "method" => method, "url" => route)
                .record(elapsed.as_secs_f64());
        });
    }

    pub fn increment_auth_rejections(&self) {
        self.auth_rejections.fetch_add(1, Ordering::Relaxed);
        self.with_recorder(|| counter!("http_in_auth_rejections_total").increment(1));
    }

    // Object store

    pub fn record_store_call(&self, operation: &'static str, elapsed: Duration, failed: bool) {
        if failed {
            self.store_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.with_recorder(|| {
            counter!("object_store_requests_total", "operation" => operation).increment(1);
            if failed {
                counter!("object_store_errors_total", "operation" => operation).increment(1);
            }
            histogram!("object_store_request_duration_seconds", "operation" => operation)
                .record(elapsed.as_secs_f64());
        });
    }

    // Files

    pub fn record_upload(&self, bytes: u64) {
        self.files_uploaded.fetch_add(1, Ordering::Relaxed);
        self.upload_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.with_recorder(|| {
            counter!("files_uploaded_total").increment(1);
            counter!("file_upload_bytes_total").increment(bytes);
        });
    }

    pub fn record_download(&self, bytes: u64) {
        self.files_downloaded.fetch_add(1, Ordering::Relaxed);
        self.download_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.with_recorder(|| {
            counter!("files_downloaded_total").increment(1);
            counter!("file_download_bytes_total").increment(bytes);
        });
    }

    pub fn record_listing(&self, files: u64, bytes: u64) {
        self.listings_served.fetch_add(1, Ordering::Relaxed);
        self.files_downloaded.fetch_add(files, Ordering::Relaxed);
        self.download_bytes.fetch_add(bytes, Ordering::Relaxed);
        self.with_recorder(|| {
            counter!("file_listings_total").increment(1);
            counter!("files_downloaded_total").increment(files);
            counter!("file_download_bytes_total").increment(bytes);
        });
    }

    pub fn increment_deletes(&self) {
        self.files_deleted.fetch_add(1, Ordering::Relaxed);
        self.with_recorder(|| counter!("files_deleted_total").increment(1));
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            requests_total: self.requests_total.load(Ordering::Relaxed),
            responses_2xx: self.responses_2xx.load(Ordering::Relaxed),
            responses_4xx: self.responses_4xx.load(Ordering::Relaxed),
            responses_5xx: self.responses_5xx.load(Ordering::Relaxed),
            auth_rejections: self.auth_rejections.load(Ordering::Relaxed),
            files_uploaded: self.files_uploaded.load(Ordering::Relaxed),
            files_downloaded: self.files_downloaded.load(Ordering::Relaxed),
            files_deleted: self.files_deleted.load(Ordering::Relaxed),
            listings_served: self.listings_served.load(Ordering::Relaxed),
            upload_bytes: self.upload_bytes.load(Ordering::Relaxed),
            download_bytes: self.download_bytes.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition
    pub fn render_prometheus(&self) -> String {
        let uptime = self.started.elapsed().as_secs_f64();
        self.with_recorder(|| gauge!("http_in_uptime_seconds").set(uptime));
        self.handle.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILES_ROUTE: &str = "/public/v1/api/files/:id";

    #[test]
    fn test_new_registry_is_zero() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.requests_total, 0);
        assert_eq!(snapshot.files_uploaded, 0);
        assert_eq!(snapshot.store_errors, 0);
    }

    #[test]
    fn test_response_classes() {
        let metrics = MetricsRegistry::new();
        for status in [200, 204, 401, 500, 302] {
            metrics.record_request("GET", FILES_ROUTE, status, Duration::from_millis(3));
        }

        let s = metrics.snapshot();
        assert_eq!(s.requests_total, 5);
        assert_eq!(s.responses_2xx, 2);
        assert_eq!(s.responses_4xx, 1);
        assert_eq!(s.responses_5xx, 1);
    }

    #[test]
    fn test_storage_counters() {
        let metrics = MetricsRegistry::new();
        metrics.record_upload(10);
        metrics.record_download(4);
        metrics.record_listing(2, 6);
        metrics.increment_deletes();

        let s = metrics.snapshot();
        assert_eq!(s.files_uploaded, 1);
        assert_eq!(s.upload_bytes, 10);
        assert_eq!(s.files_downloaded, 3);
        assert_eq!(s.download_bytes, 10);
        assert_eq!(s.listings_served, 1);
        assert_eq!(s.files_deleted, 1);
    }

    #[test]
    fn test_request_latency_and_labels_rendered() {
        let metrics = MetricsRegistry::new();
        metrics.record_request("GET", FILES_ROUTE, 200, Duration::from_millis(20));

        let text = metrics.render_prometheus();
        assert!(text.contains("http_in_response_time_seconds_bucket"), "{}", text);
        assert!(text.contains("http_in_response_time_seconds_count"), "{}", text);
        assert!(text.contains("method=\"GET\""), "{}", text);
        assert!(text.contains("url=\"/public/v1/api/files/:id\""), "{}", text);
        assert!(text.contains("code=\"200\""), "{}", text);
        assert!(text.contains("http_in_uptime_seconds"), "{}", text);
    }

    #[test]
    fn test_store_calls_rendered_per_operation() {
        let metrics = MetricsRegistry::new();
        metrics.record_store_call("get_object", Duration::from_millis(2), false);
        metrics.record_store_call("put_object", Duration::from_millis(2), true);

        let text = metrics.render_prometheus();
        assert!(text.contains("object_store_requests_total{operation=\"get_object\"} 1"), "{}", text);
        assert!(text.contains("object_store_errors_total{operation=\"put_object\"} 1"), "{}", text);
        assert!(!text.contains("object_store_errors_total{operation=\"get_object\"}"), "{}", text);
        assert!(text.contains("object_store_request_duration_seconds_bucket"), "{}", text);
        assert_eq!(metrics.snapshot().store_errors, 1);
    }

    #[test]
    fn test_registries_are_independent() {
        let a = MetricsRegistry::new();
        let b = MetricsRegistry::new();
        a.increment_auth_rejections();

        assert!(a.render_prometheus().contains("http_in_auth_rejections_total 1"));
        assert!(!b.render_prometheus().contains("http_in_auth_rejections_total 1"));
    }

    #[test]
    fn test_normalize_path_replaces_uuids() {
        assert_eq!(
            normalize_path("/notes/0b8c9a52-7a51-4a8e-9a0c-3c3b1f6a2f11/files"),
            "/notes/:uuid/files"
        );
        assert_eq!(normalize_path("/ping"), "/ping");
    }
}
