//! # Auth Module
//!
//! Bearer-token authentication in front of the file storage operations:
//! RSA-signed JWT verification and caller identity extraction. Token issuance
//! lives in a separate service.

pub mod errors;
pub mod identity;
pub mod jwt;
pub mod gate;

pub use errors::{AuthError, AuthResult};
pub use identity::CallerIdentity;
pub use jwt::{TokenClaims, TokenVerifier, ACCEPTED_ALGORITHMS};
pub use gate::{extract_bearer, AuthGate};
