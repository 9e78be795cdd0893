//! # JWT Verification
//!
//! Bearer tokens are RSA-signed JWTs issued elsewhere. This module only
//! verifies them against a single public key loaded at startup.
//!
//! ## Invariants
//! - Only the RS256/RS384/RS512 family is accepted; a token declaring any
//!   other algorithm is rejected before its signature is checked
//! - Validation is stateless
//! - `exp` is enforced when present, without leeway

use std::fmt;
use std::fs;
use std::path::Path;

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::errors::{AuthError, AuthResult};
use super::identity::CallerIdentity;

/// Signing algorithms accepted by the verifier
pub const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512];

/// Claims read from an access token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User identifier as issued by the authorization service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Standard subject claim, used when `id` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix epoch seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Caller subject, preferring `id` over `sub`
    pub fn subject(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.sub.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Verifies bearer tokens against a fixed RSA public key
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key
    pub fn from_rsa_pem(pem: &[u8]) -> AuthResult<Self> {
        if pem.iter().all(u8::is_ascii_whitespace) {
            return Err(AuthError::InvalidPublicKey("no key material".into()));
        }

        let decoding_key =
            DecodingKey::from_rsa_pem(pem).map_err(|e| AuthError::InvalidPublicKey(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Read the public key from a PEM file
    pub fn from_file(path: &Path) -> AuthResult<Self> {
        let pem = fs::read(path).map_err(|e| {
            AuthError::InvalidPublicKey(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_rsa_pem(&pem)
    }

    /// Verify a token and extract its claims
    pub fn verify_claims(&self, token: &str) -> AuthResult<TokenClaims> {
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidAlgorithm => AuthError::InvalidSigningAlgorithm,
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                JwtErrorKind::InvalidToken
                | JwtErrorKind::InvalidSignature
                | JwtErrorKind::ImmatureSignature
                | JwtErrorKind::InvalidIssuer
                | JwtErrorKind::InvalidAudience
                | JwtErrorKind::InvalidSubject
                | JwtErrorKind::MissingRequiredClaim(_)
                | JwtErrorKind::Base64(_)
                | JwtErrorKind::Json(_)
                | JwtErrorKind::Utf8(_) => AuthError::InvalidToken,
                _ => AuthError::Internal(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Verify a token and return the caller it identifies
    pub fn verify(&self, token: &str) -> AuthResult<CallerIdentity> {
        let claims = self.verify_claims(token)?;
        claims
            .subject()
            .map(CallerIdentity::new)
            .ok_or(AuthError::MissingSubject)
    }
}
