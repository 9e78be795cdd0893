//! # Auth Errors
//!
//! Error types for the authentication gate.

use thiserror::Error;

use crate::errors::ErrorKind;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Header Errors
    // ==================

    /// No `Authorization` header on the request
    #[error("Authorization header is missing")]
    MissingAuthorization,

    /// Header is not `Bearer <token>`
    #[error("Authorization header is malformed")]
    MalformedAuthorization,

    // ==================
    // Token Errors
    // ==================

    /// Token could not be parsed or its signature does not verify
    #[error("Invalid access token")]
    InvalidToken,

    /// Token declares a signing algorithm outside the accepted family
    #[error("Invalid signing method")]
    InvalidSigningAlgorithm,

    #[error("Token expired")]
    TokenExpired,

    /// Verified token carries no subject
    #[error("Token has no subject")]
    MissingSubject,

    // ==================
    // Startup / Internal Errors
    // ==================

    /// Public key is absent or not a valid RSA key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingAuthorization
            | AuthError::MalformedAuthorization
            | AuthError::InvalidToken
            | AuthError::InvalidSigningAlgorithm
            | AuthError::TokenExpired
            | AuthError::MissingSubject => ErrorKind::Authentication,

            AuthError::InvalidPublicKey(_) | AuthError::Internal(_) => ErrorKind::System,
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Message safe to show the caller.
    ///
    /// Rejections are not distinguished beyond unauthorized vs internal.
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Authentication => "Unauthorized",
            _ => "Internal server error",
        }
    }
}
