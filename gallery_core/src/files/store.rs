use async_trait::async_trait;

use crate::error::Result;
use super::models::{FileUpload, StorageStats, StoredFile};

/// The only way into the stored file collection.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn list(&self) -> Result<Vec<StoredFile>>;
    async fn store(&self, upload: FileUpload) -> Result<String>;
    async fn remove(&self, stored_name: &str) -> Result<()>;
    async fn replace(&self, old_stored_name: &str, upload: FileUpload) -> Result<String>;
    async fn read(&self, stored_name: &str) -> Result<Vec<u8>>;
    async fn stats(&self) -> Result<StorageStats>;
}
