//! Authentication gate properties, exercised both directly and through the
//! axum middleware that guards the file routes.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Request, StatusCode};
use axum::routing::get;
use axum::{middleware, Extension, Router};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use tower::ServiceExt;

use media_storage::auth::{AuthError, AuthGate, CallerIdentity, TokenClaims, TokenVerifier};
use media_storage::file_storage::{BucketFileStorage, FileService};
use media_storage::http_server::middleware::require_bearer;
use media_storage::http_server::AppState;
use media_storage::object_store::MemoryObjectStore;
use media_storage::observability::MetricsRegistry;

const PUBLIC_KEY: &[u8] = include_bytes!("fixtures/signing_key.pub");
const PRIVATE_KEY: &[u8] = include_bytes!("fixtures/signing_key.pem");
const FOREIGN_PRIVATE_KEY: &[u8] = include_bytes!("fixtures/foreign_key.pem");

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
}

fn sign_with(private_key: &[u8], subject: &str) -> String {
    let claims = TokenClaims {
        id: Some(subject.to_string()),
        sub: None,
        exp: Some(now() + 900),
    };
    let key = EncodingKey::from_rsa_pem(private_key).unwrap();
    encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap()
}

fn gate() -> AuthGate {
    AuthGate::new(TokenVerifier::from_rsa_pem(PUBLIC_KEY).unwrap())
}

fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
}

// =============================================================================
// Gate
// =============================================================================

#[test]
fn test_valid_token_accepted_with_subject() {
    let token = sign_with(PRIVATE_KEY, "u1");
    let caller = gate().authenticate(&headers(&format!("Bearer {}", token))).unwrap();
    assert_eq!(caller.subject(), "u1");
}

#[test]
fn test_token_from_foreign_key_rejected() {
    let token = sign_with(FOREIGN_PRIVATE_KEY, "u1");
    let err = gate().authenticate(&headers(&format!("Bearer {}", token))).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
    assert_eq!(err.status_code(), 401);
}

#[test]
fn test_missing_scheme_rejected_before_verification() {
    let token = sign_with(PRIVATE_KEY, "u1");
    let err = gate().authenticate(&headers(&token)).unwrap_err();
    assert!(matches!(err, AuthError::MalformedAuthorization));
}

#[test]
fn test_symmetric_algorithm_substitution_rejected() {
    let claims = TokenClaims {
        id: Some("u1".into()),
        sub: None,
        exp: Some(now() + 900),
    };
    let key = EncodingKey::from_secret(PUBLIC_KEY);
    let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();

    let err = gate().authenticate(&headers(&format!("Bearer {}", token))).unwrap_err();
    assert!(matches!(err, AuthError::InvalidSigningAlgorithm));
    assert_eq!(err.status_code(), 401);
}

#[test]
fn test_expired_token_rejected() {
    let claims = TokenClaims {
        id: Some("u1".into()),
        sub: None,
        exp: Some(now() - 60),
    };
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY).unwrap();
    let token = encode(&Header::new(Algorithm::RS256), &claims, &key).unwrap();

    let err = gate().authenticate(&headers(&format!("Bearer {}", token))).unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[test]
fn test_malformed_public_key_is_fatal() {
    let err = TokenVerifier::from_rsa_pem(b"-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----\n")
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidPublicKey(_)));
}

// =============================================================================
// Middleware
// =============================================================================

async fn whoami(Extension(caller): Extension<CallerIdentity>) -> String {
    caller.subject().to_string()
}

fn app() -> (Router, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new());
    let files = FileService::new(Arc::new(BucketFileStorage::new(MemoryObjectStore::new())));
    let state = AppState::new(files, gate(), metrics.clone());

    let router = Router::new()
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state);
    (router, metrics)
}

async fn call(router: Router, authorization: Option<String>) -> (StatusCode, String) {
    let mut request = Request::builder().uri("/whoami");
    if let Some(value) = authorization {
        request = request.header(AUTHORIZATION, value);
    }

    let response = router.oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_handler_observes_subject() {
    let (router, metrics) = app();
    let token = sign_with(PRIVATE_KEY, "u1");

    let (status, body) = call(router, Some(format!("Bearer {}", token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "u1");
    assert_eq!(metrics.snapshot().auth_rejections, 0);
}

#[tokio::test]
async fn test_foreign_signature_is_unauthorized() {
    let (router, metrics) = app();
    let token = sign_with(FOREIGN_PRIVATE_KEY, "u1");

    let (status, body) = call(router, Some(format!("Bearer {}", token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(json["code"], 401);
    assert_eq!(json["data"], serde_json::json!([]));
    assert_eq!(metrics.snapshot().auth_rejections, 1);
}

#[tokio::test]
async fn test_missing_bearer_scheme_is_unauthorized() {
    let (router, _) = app();
    let token = sign_with(PRIVATE_KEY, "u1");

    let (status, _) = call(router, Some(token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let (router, _) = app();
    let (status, _) = call(router, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
