//! # Authentication Gate
//!
//! Per-request extract → verify → accept. Nothing is kept between requests.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use super::errors::{AuthError, AuthResult};
use super::identity::CallerIdentity;
use super::jwt::TokenVerifier;

const BEARER_SCHEME: &str = "Bearer";

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly two space-separated parts, the first being
/// `Bearer`.
pub fn extract_bearer(header: &str) -> AuthResult<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER_SCHEME), Some(token), None) => Ok(token),
        _ => Err(AuthError::MalformedAuthorization),
    }
}

/// Gate in front of every storage operation
#[derive(Debug, Clone)]
pub struct AuthGate {
    verifier: Arc<TokenVerifier>,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }

    /// Authenticate a request from its headers
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<CallerIdentity> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?
            .to_str()
            .map_err(|_| AuthError::MalformedAuthorization)?;

        if header.is_empty() {
            return Err(AuthError::MissingAuthorization);
        }

        let token = extract_bearer(header)?;
        self.verifier.verify(token)
    }
}
