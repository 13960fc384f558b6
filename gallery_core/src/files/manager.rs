use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use super::kind::FileKind;
use super::models::{FileUpload, StorageStats, StoredFile};
use super::naming::{check_stored_name, NameGenerator};
use super::store::FileStore;
use super::validation::{FileValidationConfig, FileValidator};

#[derive(Clone)]
pub struct FileManagerConfig {
    pub storage_path: PathBuf,
    pub validation: FileValidationConfig,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("uploads"),
            validation: FileValidationConfig::default(),
        }
    }
}

impl From<&StorageConfig> for FileManagerConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            storage_path: config.upload_dir.clone(),
            validation: FileValidationConfig {
                verify_signatures: config.verify_signatures,
                ..Default::default()
            },
        }
    }
}

/// Owns one directory of uploads. The directory listing is the index.
#[derive(Clone)]
pub struct FileManager {
    config: FileManagerConfig,
    validator: FileValidator,
    names: NameGenerator,
}

impl FileManager {
    pub fn new(config: FileManagerConfig) -> Self {
        let validator = FileValidator::new(config.validation.clone());

        Self {
            config,
            validator,
            names: NameGenerator::new(),
        }
    }

    pub async fn initialize(&self) -> Result<()> {
        if !self.config.storage_path.exists() {
            async_fs::create_dir_all(&self.config.storage_path).await?;
            info!("Created storage directory {}", self.config.storage_path.display());
        }
        Ok(())
    }

    /// Path of a stored entry. Names `list` would never report are not found.
    fn entry_path(&self, stored_name: &str) -> Result<PathBuf> {
        check_stored_name(stored_name)?;
        if FileKind::from_filename(stored_name).is_none() {
            return Err(AppError::NotFound("File not found".to_string()));
        }
        Ok(self.config.storage_path.join(stored_name))
    }

    /// Writes `data` under a fresh stored name. Content is staged in a hidden
    /// file and renamed into place, so listings never see a partial write.
    async fn write_new_entry(&self, original_filename: &str, data: &[u8]) -> Result<String> {
        let staging_path = self
            .config
            .storage_path
            .join(format!(".upload-{}.part", Uuid::new_v4()));

        let mut file = async_fs::File::create(&staging_path)
            .await
            .map_err(storage_error)?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = async_fs::remove_file(&staging_path).await;
            return Err(e.into());
        }

        loop {
            let stored_name = self.names.stored_name(original_filename);
            let target = self.config.storage_path.join(&stored_name);

            // Another process may share the directory; never rename over an entry.
            match async_fs::try_exists(&target).await {
                Ok(true) => {
                    debug!("Stored name {} already taken, drawing a new token", stored_name);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    let _ = async_fs::remove_file(&staging_path).await;
                    return Err(e.into());
                }
            }

            if let Err(e) = async_fs::rename(&staging_path, &target).await {
                let _ = async_fs::remove_file(&staging_path).await;
                return Err(e.into());
            }

            return Ok(stored_name);
        }
    }
}

#[async_trait]
impl FileStore for FileManager {
    async fn list(&self) -> Result<Vec<StoredFile>> {
        let mut entries = async_fs::read_dir(&self.config.storage_path)
            .await
            .map_err(storage_error)?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(storage_error)? {
            let file_type = entry.file_type().await.map_err(storage_error)?;
            if !file_type.is_file() {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!("Skipping non UTF-8 entry in storage directory: {:?}", entry.file_name());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }

            match FileKind::from_filename(&name) {
                Some(kind) => files.push(StoredFile { stored_name: name, kind }),
                None => warn!("Skipping entry with unsupported extension: {}", name),
            }
        }

        files.sort_by(|a, b| a.stored_name.cmp(&b.stored_name));
        Ok(files)
    }

    async fn store(&self, upload: FileUpload) -> Result<String> {
        let kind = self
            .validator
            .validate_upload(&upload.original_filename, &upload.data)?;

        let stored_name = self
            .write_new_entry(&upload.original_filename, &upload.data)
            .await?;

        info!(
            stored_name = %stored_name,
            kind = kind.as_str(),
            size = upload.data.len(),
            "Stored upload"
        );
        Ok(stored_name)
    }

    async fn remove(&self, stored_name: &str) -> Result<()> {
        let path = self.entry_path(stored_name)?;

        match async_fs::remove_file(&path).await {
            Ok(()) => {
                info!(stored_name = %stored_name, "Removed file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, old_stored_name: &str, upload: FileUpload) -> Result<String> {
        let old_path = match self.entry_path(old_stored_name) {
            Ok(path) => Some(path),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let stored_name = self.store(upload).await?;

        let removed = match old_path {
            Some(path) => async_fs::remove_file(&path).await,
            None => Err(ErrorKind::NotFound.into()),
        };
        match removed {
            Ok(()) => {
                info!(old = %old_stored_name, new = %stored_name, "Replaced file");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(old = %old_stored_name, new = %stored_name, "Replaced file that was already gone");
            }
            Err(e) => return Err(e.into()),
        }

        Ok(stored_name)
    }

    async fn read(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(stored_name)?;

        match async_fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn stats(&self) -> Result<StorageStats> {
        let files = self.list().await?;

        let mut total_size = 0;
        for file in &files {
            let metadata = async_fs::metadata(self.config.storage_path.join(&file.stored_name)).await;
            // Entries can disappear between the listing and the stat.
            if let Ok(metadata) = metadata {
                total_size += metadata.len();
            }
        }

        Ok(StorageStats {
            file_count: files.len() as u64,
            total_size,
            storage_path: self.config.storage_path.clone(),
        })
    }
}

fn storage_error(err: std::io::Error) -> AppError {
    AppError::StorageUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_setup() -> (FileManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();

        let config = FileManagerConfig {
            storage_path: temp_dir.path().to_path_buf(),
            validation: FileValidationConfig::default(),
        };

        let manager = FileManager::new(config);
        manager.initialize().await.unwrap();

        (manager, temp_dir)
    }

    fn dir_entries(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_store_and_read_file() {
        let (manager, _temp_dir) = create_test_setup().await;

        let name = manager
            .store(FileUpload::new("photo.png", b"Hello, World!".to_vec()))
            .await
            .unwrap();
        assert!(name.ends_with("-photo.png"));

        let data = manager.read(&name).await.unwrap();
        assert_eq!(data, b"Hello, World!");
    }

    #[tokio::test]
    async fn test_no_staging_files_left_behind() {
        let (manager, temp_dir) = create_test_setup().await;

        let name = manager.store(FileUpload::new("scan.pdf", b"%PDF".to_vec())).await.unwrap();
        assert_eq!(dir_entries(&temp_dir), vec![name]);
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let (manager, temp_dir) = create_test_setup().await;

        let result = manager.store(FileUpload::new("script.exe", b"MZ".to_vec())).await;
        assert!(matches!(result, Err(AppError::UnsupportedFileType(_))));
        assert!(dir_entries(&temp_dir).is_empty());
    }

    #[tokio::test]
    async fn test_list_classifies_and_skips_foreign_entries() {
        let (manager, temp_dir) = create_test_setup().await;

        manager.store(FileUpload::new("a.png", b"png".to_vec())).await.unwrap();
        manager.store(FileUpload::new("b.PDF", b"pdf".to_vec())).await.unwrap();

        std::fs::write(temp_dir.path().join("stray.txt"), b"x").unwrap();
        std::fs::write(temp_dir.path().join(".upload-abc.part"), b"x").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested.png")).unwrap();

        let files = manager.list().await.unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].kind, FileKind::Image);
        assert!(files[0].stored_name.ends_with("-a.png"));
        assert_eq!(files[1].kind, FileKind::Document);
        assert!(files[1].stored_name.ends_with("-b.PDF"));
    }

    #[tokio::test]
    async fn test_list_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileManager::new(FileManagerConfig {
            storage_path: temp_dir.path().join("missing"),
            validation: FileValidationConfig::default(),
        });

        let result = manager.list().await;
        assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let (manager, _temp_dir) = create_test_setup().await;

        let name = manager.store(FileUpload::new("delete_me.gif", b"GIF89a".to_vec())).await.unwrap();
        manager.remove(&name).await.unwrap();

        assert!(manager.list().await.unwrap().is_empty());
        assert!(matches!(manager.remove(&name).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let manager = FileManager::new(FileManagerConfig {
            storage_path: temp_dir.path().join("store"),
            validation: FileValidationConfig::default(),
        });
        manager.initialize().await.unwrap();

        let outside = temp_dir.path().join("outside.png");
        std::fs::write(&outside, b"keep").unwrap();

        let result = manager.remove("../outside.png").await;
        assert!(matches!(result, Err(AppError::InvalidFileName(_))));
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_names_with_double_dots_stay_manageable() {
        let (manager, _temp_dir) = create_test_setup().await;

        let first = manager.store(FileUpload::new("a..b.png", b"png".to_vec())).await.unwrap();
        assert!(first.ends_with("-a..b.png"));
        assert_eq!(manager.read(&first).await.unwrap(), b"png");
        manager.remove(&first).await.unwrap();
        assert!(manager.list().await.unwrap().is_empty());

        let old = manager.store(FileUpload::new("my..photo.png", b"old".to_vec())).await.unwrap();
        let new = manager.replace(&old, FileUpload::new("b.png", b"new".to_vec())).await.unwrap();
        let files = manager.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].stored_name, new);
    }

    #[tokio::test]
    async fn test_mutations_ignore_unlisted_entries() {
        let (manager, temp_dir) = create_test_setup().await;
        let stray = temp_dir.path().join("stray.txt");
        std::fs::write(&stray, b"x").unwrap();

        assert!(matches!(manager.remove("stray.txt").await, Err(AppError::NotFound(_))));
        assert!(matches!(manager.read("stray.txt").await, Err(AppError::NotFound(_))));

        let new = manager.replace("stray.txt", FileUpload::new("c.gif", b"gif".to_vec())).await.unwrap();
        assert!(stray.exists());
        let files = manager.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].stored_name, new);
    }

    #[tokio::test]
    async fn test_replace_validates_before_removing() {
        let (manager, _temp_dir) = create_test_setup().await;

        let old = manager.store(FileUpload::new("keep.png", b"png".to_vec())).await.unwrap();
        let result = manager.replace(&old, FileUpload::new("evil.exe", b"MZ".to_vec())).await;
        assert!(matches!(result, Err(AppError::UnsupportedFileType(_))));

        let files = manager.list().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].stored_name, old);
    }

    #[tokio::test]
    async fn test_stats() {
        let (manager, _temp_dir) = create_test_setup().await;

        manager.store(FileUpload::new("a.png", vec![0u8; 10])).await.unwrap();
        manager.store(FileUpload::new("b.pdf", vec![0u8; 32])).await.unwrap();

        let stats = manager.stats().await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_size, 42);
    }
}
