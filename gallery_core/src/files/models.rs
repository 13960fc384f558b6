use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::kind::FileKind;

/// One persisted upload as seen by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub stored_name: String,
    pub kind: FileKind,
}

#[derive(Debug)]
pub struct FileUpload {
    pub original_filename: String,
    pub data: Vec<u8>,
}

impl FileUpload {
    pub fn new(original_filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            original_filename: original_filename.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub file_count: u64,
    pub total_size: u64,
    pub storage_path: PathBuf,
}
