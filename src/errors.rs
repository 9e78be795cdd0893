//! # Error Kinds
//!
//! Caller-facing classification shared by every module. Module errors
//! (`StorageError`, `AuthError`) map themselves onto one of these kinds and
//! the HTTP boundary turns the kind into a status code.

use std::fmt;

/// Classification of a failure as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required identifier or parameter is missing
    Validation,
    /// The requested resource does not exist
    NotFound,
    /// The resource already exists (reserved, no operation raises it today)
    Conflict,
    /// Missing, malformed or incorrectly signed credentials
    Authentication,
    /// Any unclassified store, I/O or internal failure
    System,
}

impl ErrorKind {
    /// HTTP status code for this kind
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Authentication => 401,
            ErrorKind::System => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Authentication => "authentication",
            ErrorKind::System => "system",
        }
    }

    /// Whether the caller is to blame for the failure
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
