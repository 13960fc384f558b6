use thiserror::Error;

use crate::error::AppError;
use super::kind::{extension_of, FileKind};
use super::naming::sanitize_filename;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Only PDF or Image files are allowed (got {filename})")]
    UnsupportedType { filename: String },

    #[error("Filename too long: {length} characters (max: {max_length})")]
    FilenameTooLong { length: usize, max_length: usize },

    #[error("Invalid filename: {filename:?}")]
    InvalidFilename { filename: String },

    #[error("File content does not match its .{extension} extension")]
    SignatureMismatch { extension: String },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnsupportedType { .. } | ValidationError::SignatureMismatch { .. } => {
                AppError::UnsupportedFileType(err.to_string())
            }
            ValidationError::FilenameTooLong { .. } | ValidationError::InvalidFilename { .. } => {
                AppError::InvalidFileName(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileValidationConfig {
    pub max_filename_length: usize,
    pub verify_signatures: bool,
}

impl Default for FileValidationConfig {
    fn default() -> Self {
        Self {
            max_filename_length: 255,
            verify_signatures: false,
        }
    }
}

#[derive(Clone)]
pub struct FileValidator {
    config: FileValidationConfig,
}

impl FileValidator {
    pub fn new(config: FileValidationConfig) -> Self {
        Self { config }
    }

    pub fn with_default_config() -> Self {
        Self::new(FileValidationConfig::default())
    }

    /// Checks an incoming upload and returns the kind it will be listed as.
    /// The type is decided on the sanitized name, which is what ends up on disk.
    pub fn validate_upload(&self, filename: &str, data: &[u8]) -> Result<FileKind, ValidationError> {
        self.validate_filename(filename)?;

        let kind = FileKind::from_filename(&sanitize_filename(filename)).ok_or_else(|| ValidationError::UnsupportedType {
            filename: filename.to_string(),
        })?;

        if self.config.verify_signatures {
            self.validate_magic_bytes(filename, data)?;
        }

        Ok(kind)
    }

    fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.len() > self.config.max_filename_length {
            return Err(ValidationError::FilenameTooLong {
                length: filename.len(),
                max_length: self.config.max_filename_length,
            });
        }

        if filename.trim().is_empty() || filename.contains('\0') {
            return Err(ValidationError::InvalidFilename {
                filename: filename.to_string(),
            });
        }

        Ok(())
    }

    fn validate_magic_bytes(&self, filename: &str, data: &[u8]) -> Result<(), ValidationError> {
        let extension = extension_of(filename).unwrap_or("").to_ascii_lowercase();

        let magic_matches = match extension.as_str() {
            "jpg" | "jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            "png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
            "gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
            "pdf" => data.starts_with(b"%PDF"),
            _ => false,
        };

        if !magic_matches {
            return Err(ValidationError::SignatureMismatch { extension });
        }

        Ok(())
    }
}
