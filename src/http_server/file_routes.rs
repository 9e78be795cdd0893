//! File HTTP Routes
//!
//! Attachment endpoints under `/public/v1/api/files`. Every route requires a
//! bearer token; the caller identity is read from the request extensions.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::middleware::{require_bearer, track_metrics};
use super::response::{ApiError, JsonResponse};
use super::state::AppState;
use crate::auth::CallerIdentity;
use crate::file_storage::{File, NewFile};
use crate::object_store::BINARY_CONTENT_TYPE;

pub const FILES_PATH: &str = "/public/v1/api/files";

const NOTE_UUID_REQUIRED: &str = "note_uuid query parameter is required";
const FILE_REQUIRED: &str = "file required";

#[derive(Debug, Default, Deserialize)]
pub struct NoteQuery {
    #[serde(default)]
    pub note_uuid: Option<String>,
}

impl NoteQuery {
    fn require(self) -> Result<String, ApiError> {
        match self.note_uuid {
            Some(note_uuid) if !note_uuid.is_empty() => Ok(note_uuid),
            _ => Err(ApiError::BadRequest(NOTE_UUID_REQUIRED.to_string())),
        }
    }
}

/// File as listed in JSON, content base64-encoded
#[derive(Debug, Serialize)]
pub struct FileView {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub bytes: String,
}

impl From<&File> for FileView {
    fn from(file: &File) -> Self {
        Self {
            id: file.id.clone(),
            name: file.name.clone(),
            size: file.size,
            bytes: STANDARD.encode(&file.bytes),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedFile {
    pub id: String,
}

/// Build the authenticated file router
pub fn file_routes(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route(FILES_PATH, get(list_files).post(create_file))
        .route(
            &format!("{}/:id", FILES_PATH),
            get(get_file).delete(delete_file),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

fn attachment_disposition(name: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("attachment; filename={}", name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

async fn get_file(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Query(query): Query<NoteQuery>,
) -> Result<Response, ApiError> {
    let note_uuid = query.require()?;
    let file = state.files.get_file(&caller, &note_uuid, &id).await?;
    state.metrics.record_download(file.bytes.len() as u64);

    Ok((
        [
            (header::CONTENT_DISPOSITION, attachment_disposition(&file.name)),
            (header::CONTENT_TYPE, HeaderValue::from_static(BINARY_CONTENT_TYPE)),
        ],
        file.bytes,
    )
        .into_response())
}

async fn list_files(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<NoteQuery>,
) -> Result<Json<Vec<FileView>>, ApiError> {
    let note_uuid = query.require()?;
    let files = state.files.list_files(&caller, &note_uuid).await?;

    let bytes: u64 = files.iter().map(|f| f.bytes.len() as u64).sum();
    state.metrics.record_listing(files.len() as u64, bytes);

    Ok(Json(files.iter().map(FileView::from).collect()))
}

/// Multipart upload: a `file` part plus `note_uuid` as a form field or query
/// parameter. Only the first `file` part is stored.
async fn create_file(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Query(query): Query<NoteQuery>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut note_uuid = query.note_uuid.filter(|n| !n.is_empty());
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let part = field.name().map(str::to_owned);
        match part.as_deref() {
            Some("file") if upload.is_none() => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content = field.bytes().await?;
                upload = Some((name, content));
            }
            Some("note_uuid") => {
                let value = field.text().await?;
                if !value.is_empty() {
                    note_uuid = Some(value);
                }
            }
            _ => {}
        }
    }

    let (name, content) = upload.ok_or_else(|| ApiError::BadRequest(FILE_REQUIRED.to_string()))?;
    let note_uuid = NoteQuery { note_uuid }.require()?;

    let size = content.len() as u64;
    let file = state
        .files
        .create_file(&caller, &note_uuid, NewFile::new(name, size, &content[..]))
        .await?;
    state.metrics.record_upload(file.size);

    Ok((StatusCode::CREATED, Json(JsonResponse::data(CreatedFile { id: file.id }))).into_response())
}

async fn delete_file(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    Path(id): Path<String>,
    Query(query): Query<NoteQuery>,
) -> Result<StatusCode, ApiError> {
    let note_uuid = query.require()?;
    state.files.delete_file(&caller, &note_uuid, &id).await?;
    state.metrics.increment_deletes();

    Ok(StatusCode::NO_CONTENT)
}
