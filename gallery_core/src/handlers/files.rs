use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    error::{AppError, Result},
    files::{FileUpload, StoredFile},
    AppState,
};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub filename: String,
    #[serde(rename = "type")]
    pub file_type: &'static str,
}

impl From<StoredFile> for FileEntry {
    fn from(file: StoredFile) -> Self {
        Self {
            file_type: file.kind.as_str(),
            filename: file.stored_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileActionResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl FileActionResponse {
    fn new(message: &str, file: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            file,
        }
    }
}

pub async fn list_files(State(state): State<AppState>) -> Result<Json<Vec<FileEntry>>> {
    let files = state.file_store.list().await?;
    debug!("GET /files - {} entries", files.len());

    Ok(Json(files.into_iter().map(FileEntry::from).collect()))
}

pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FileActionResponse>> {
    let upload = read_file_part(multipart).await?;
    info!("POST /upload - {} ({} bytes)", upload.original_filename, upload.data.len());

    let stored_name = state.file_store.store(upload).await?;

    Ok(Json(FileActionResponse::new("File uploaded", Some(stored_name))))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<FileActionResponse>> {
    info!("DELETE /delete/{}", filename);

    state.file_store.remove(&filename).await?;

    Ok(Json(FileActionResponse::new("File deleted", None)))
}

pub async fn update_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<FileActionResponse>> {
    // The new file must be in hand before the old one is touched.
    let upload = read_file_part(multipart).await?;
    info!("PUT /update/{} - {}", filename, upload.original_filename);

    let stored_name = state.file_store.replace(&filename, upload).await?;

    Ok(Json(FileActionResponse::new("File updated", Some(stored_name))))
}

pub async fn serve_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let data = state.file_store.read(&filename).await?;

    let content_type = mime_guess::from_path(&filename).first_or(mime::APPLICATION_OCTET_STREAM);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        data,
    )
        .into_response())
}

/// Pulls the first `file` part out of a multipart body. Other fields are skipped.
async fn read_file_part(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<FileUpload> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Request body is not multipart: {}", rejection);
        AppError::MissingFile
    })?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read file data", e))?;

        return Ok(FileUpload::new(filename, data.to_vec()));
    }

    Err(AppError::MissingFile)
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge("Upload exceeds the request body limit".to_string());
    }
    AppError::BadRequest(format!("{}: {}", context, err.body_text()))
}
