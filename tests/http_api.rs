//! End-to-end HTTP tests: the full router with its middleware stack, driven
//! in-process over the in-memory object store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::Value;
use tower::ServiceExt;

use media_storage::auth::{AuthGate, TokenClaims, TokenVerifier};
use media_storage::file_storage::{BucketFileStorage, File, FileService};
use media_storage::http_server::{AppState, HttpServer, HttpServerConfig};
use media_storage::object_store::{MemoryObjectStore, MeteredObjectStore, ObjectFault};
use media_storage::observability::MetricsRegistry;

const BOUNDARY: &str = "media-storage-test-boundary";

struct TestApp {
    storage: Arc<BucketFileStorage<MeteredObjectStore<MemoryObjectStore>>>,
    metrics: Arc<MetricsRegistry>,
    token: String,
}

impl TestApp {
    fn new() -> Self {
        let claims = TokenClaims {
            id: Some("u1".into()),
            sub: None,
            exp: None,
        };
        let key = EncodingKey::from_rsa_pem(include_bytes!("fixtures/signing_key.pem")).unwrap();
        let token = encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap();

        let metrics = Arc::new(MetricsRegistry::new());
        let store = MeteredObjectStore::new(MemoryObjectStore::new(), metrics.clone());
        Self {
            storage: Arc::new(BucketFileStorage::new(store)),
            metrics,
            token,
        }
    }

    fn state(&self) -> AppState {
        let verifier = TokenVerifier::from_rsa_pem(include_bytes!("fixtures/signing_key.pub")).unwrap();
        AppState::new(
            FileService::new(self.storage.clone()),
            AuthGate::new(verifier),
            self.metrics.clone(),
        )
        .with_version("1.2.3")
    }

    async fn send(&self, request: Request<Body>) -> Response {
        HttpServer::new(HttpServerConfig::default(), self.state())
            .service()
            .oneshot(request)
            .await
            .unwrap()
    }

    fn authed(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    async fn upload(&self, uri: &str, parts: &[Part<'_>]) -> Response {
        let request = self
            .authed("POST", uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }
}

enum Part<'a> {
    File { name: &'a str, content: &'a [u8] },
    Field { name: &'a str, value: &'a str },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, content } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
            Part::Field { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value).as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// =============================================================================
// Unauthenticated endpoints
// =============================================================================

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new();
    let response = app.send(get("/ping")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"data": "pong"}));
}

#[tokio::test]
async fn test_version() {
    let app = TestApp::new();
    let response = app.send(get("/version")).await;
    assert_eq!(body_json(response).await, serde_json::json!({"data": "1.2.3"}));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    let response = app.send(get("/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with("404 page not found. Check docs: "));
}

#[tokio::test]
async fn test_request_id_generated() {
    let app = TestApp::new();
    let response = app.send(get("/ping")).await;
    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_request_id_propagated() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/ping")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.headers().get("x-request-id").unwrap(), "abc-123");
}

// =============================================================================
// File API
// =============================================================================

#[tokio::test]
async fn test_files_require_token() {
    let app = TestApp::new();
    let response = app.send(get("/public/v1/api/files?note_uuid=n1")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(app.metrics.snapshot().auth_rejections, 1);
}

#[tokio::test]
async fn test_upload_get_list_delete() {
    let app = TestApp::new();

    let response = app
        .upload(
            "/public/v1/api/files",
            &[
                Part::Field { name: "note_uuid", value: "n1" },
                Part::File { name: "a.txt", content: b"hello" },
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(id, File::derive_id("a.txt", b"hello"));

    // single get returns raw bytes
    let response = app
        .send(app.authed("GET", &format!("/public/v1/api/files/{}?note_uuid=n1", id)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=a.txt"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(body_bytes(response).await, b"hello");

    // listing returns base64 content; trailing slash is normalised
    let response = app
        .send(app.authed("GET", "/public/v1/api/files/?note_uuid=n1").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["id"], id.as_str());
    assert_eq!(files[0]["name"], "a.txt");
    assert_eq!(files[0]["size"], 5);
    assert_eq!(files[0]["bytes"], STANDARD.encode(b"hello"));

    // delete twice, then get is 404
    for _ in 0..2 {
        let response = app
            .send(app.authed("DELETE", &format!("/public/v1/api/files/{}?note_uuid=n1", id)).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let response = app
        .send(app.authed("GET", &format!("/public/v1/api/files/{}?note_uuid=n1", id)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 404);

    let s = app.metrics.snapshot();
    assert_eq!(s.files_uploaded, 1);
    assert_eq!(s.files_deleted, 2);
    assert_eq!(s.listings_served, 1);
}

#[tokio::test]
async fn test_upload_note_from_query() {
    let app = TestApp::new();
    let response = app
        .upload(
            "/public/v1/api/files?note_uuid=n2",
            &[Part::File { name: "b.bin", content: b"\x00\x01" }],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(app.storage.store().inner().object_count("n2"), Some(1));
}

#[tokio::test]
async fn test_upload_without_file_part() {
    let app = TestApp::new();
    let response = app
        .upload(
            "/public/v1/api/files",
            &[Part::Field { name: "note_uuid", value: "n1" }],
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "file required");
}

#[tokio::test]
async fn test_upload_without_note() {
    let app = TestApp::new();
    let response = app
        .upload("/public/v1/api/files", &[Part::File { name: "a.txt", content: b"x" }])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "note_uuid query parameter is required"
    );
}

#[tokio::test]
async fn test_get_without_note() {
    let app = TestApp::new();
    let response = app
        .send(app.authed("GET", "/public/v1/api/files/some-id").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "note_uuid query parameter is required");
    assert_eq!(json["code"], 400);
    assert_eq!(json["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_list_of_empty_note_is_404() {
    let app = TestApp::new();
    let response = app
        .send(app.authed("GET", "/public/v1/api/files?note_uuid=never-used").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_from_unknown_note_is_404() {
    let app = TestApp::new();
    let response = app
        .send(
            app.authed("GET", "/public/v1/api/files/some-id?note_uuid=never-used")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], 404);
}

#[tokio::test]
async fn test_list_skips_unreadable_file() {
    let app = TestApp::new();
    for (name, content) in [("ok.txt", &b"fine"[..]), ("bad.txt", &b"broken"[..])] {
        let response = app
            .upload(
                "/public/v1/api/files?note_uuid=n1",
                &[Part::File { name, content }],
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    app.storage
        .store()
        .inner()
        .inject_fault("n1", &File::derive_id("bad.txt", b"broken"), ObjectFault::Unreadable)
        .unwrap();

    let response = app
        .send(app.authed("GET", "/public/v1/api/files?note_uuid=n1").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "ok.txt");
}

#[tokio::test]
async fn test_store_failure_on_get_is_500() {
    let app = TestApp::new();
    app.upload(
        "/public/v1/api/files?note_uuid=n1",
        &[Part::File { name: "a.txt", content: b"x" }],
    )
    .await;
    let id = File::derive_id("a.txt", b"x");
    app.storage
        .store()
        .inner()
        .inject_fault("n1", &id, ObjectFault::Unavailable)
        .unwrap();

    let response = app
        .send(app.authed("GET", &format!("/public/v1/api/files/{}?note_uuid=n1", id)).body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.metrics.snapshot().responses_5xx, 1);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();
    app.send(get("/public/v1/api/files?note_uuid=n1")).await;

    let response = app.send(get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("http_in_auth_rejections_total 1"), "{}", text);
    assert!(text.contains("http_in_response_time_seconds_bucket"), "{}", text);
    assert!(text.contains("method=\"GET\""), "{}", text);
    assert!(text.contains("url=\"/public/v1/api/files\""), "{}", text);
    assert!(text.contains("code=\"401\""), "{}", text);
}

#[tokio::test]
async fn test_metrics_cover_object_store_calls() {
    let app = TestApp::new();
    let response = app
        .upload(
            "/public/v1/api/files?note_uuid=n1",
            &[Part::File { name: "a.txt", content: b"hello" }],
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let text = app.metrics.render_prometheus();
    assert!(
        text.contains("object_store_requests_total{operation=\"put_object\"} 1"),
        "{}",
        text
    );
    assert!(text.contains("object_store_request_duration_seconds_bucket"), "{}", text);
    assert!(text.contains("code=\"201\""), "{}", text);
}
