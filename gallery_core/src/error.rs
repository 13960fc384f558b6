//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::MissingFile | AppError::InvalidFileName(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::StorageUnavailable(_) | AppError::IoError(_) | AppError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code carried in the `error` field of the body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType(_) => "unsupported_file_type",
            AppError::MissingFile => "missing_file",
            AppError::InvalidFileName(_) => "invalid_file_name",
            AppError::BadRequest(_) => "bad_request",
            AppError::NotFound(_) => "not_found",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::IoError(_) | AppError::Other(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match self {
            AppError::UnsupportedFileType(msg)
            | AppError::InvalidFileName(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::PayloadTooLarge(msg) => msg,
            AppError::MissingFile => "No file uploaded".to_string(),
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                "Storage unavailable".to_string()
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                "Internal server error".to_string()
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                "Internal server error".to_string()
            }
        };

        let body = Json(json!({
            "message": message,
            "error": code,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
