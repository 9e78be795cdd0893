//! JSON envelope and error responses

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::errors::ErrorKind;
use crate::file_storage::StorageError;

/// Response envelope shared by all JSON endpoints
#[derive(Debug, Serialize)]
pub struct JsonResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl<T: Serialize> JsonResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            code: None,
        }
    }
}

/// Build an error envelope `{"data":[],"error":…,"code":…}`
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = JsonResponse {
        data: Some(Vec::<u8>::new()),
        error: Some(message.into()),
        code: Some(status.as_u16()),
    };
    (status, Json(body)).into_response()
}

/// Errors surfaced by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    Storage(StorageError),
    Auth(AuthError),
    BadRequest(String),
    Multipart(MultipartError),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::Storage(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Multipart(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

fn status_from(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            ApiError::Multipart(e) => error_response(e.status(), e.body_text()),
            ApiError::Auth(e) => {
                if e.kind() == ErrorKind::System {
                    warn!(error = %e, "err parsing token");
                }
                error_response(status_from(e.status_code()), e.public_message())
            }
            ApiError::Storage(e) if e.is_missing_object() => {
                error_response(StatusCode::NOT_FOUND, e.to_string())
            }
            ApiError::Storage(e) => {
                let status = status_from(e.status_code());
                if status.is_server_error() {
                    error!(error = %e, "storage operation failed");
                }
                error_response(status, e.to_string())
            }
        }
    }
}
