use crate::{detect_content_type, StorageBackend, StorageError, StorageResult, StoredObject};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Filesystem backend serving keys relative to a base directory.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Validate and sanitize the storage path to prevent directory traversal
    fn validate_path(&self, path: &str) -> StorageResult<PathBuf> {
        let clean_path = path.trim_start_matches('/');

        if clean_path.is_empty() {
            return Err(StorageError::InvalidPath("Empty path".to_string()));
        }

        if clean_path.contains("..") || clean_path.contains("./") || clean_path.contains('\\') {
            return Err(StorageError::InvalidPath(format!(
                "Path contains invalid sequences: {}",
                path
            )));
        }

        let full_path = self.base_path.join(clean_path);

        if !full_path.starts_with(&self.base_path) {
            return Err(StorageError::InvalidPath(format!(
                "Path outside base directory: {}",
                path
            )));
        }

        Ok(full_path)
    }

    /// Write an object, creating parent directories as needed.
    pub async fn store(&self, path: &str, data: &[u8]) -> StorageResult<StoredObject> {
        let file_path = self.validate_path(path)?;

        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                debug!("Creating directory: {:?}", parent);
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(&file_path, data).await?;
        debug!("Stored {} bytes at {:?}", data.len(), file_path);

        Ok(StoredObject {
            data: data.to_vec(),
            content_type: Some(detect_content_type(path).to_string()),
        })
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn retrieve(&self, path: &str) -> StorageResult<StoredObject> {
        let file_path = self.validate_path(path)?;

        debug!("Retrieving file from: {:?}", file_path);

        let data = match fs::read(&file_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        debug!("Retrieved file: {} bytes", data.len());

        Ok(StoredObject {
            data,
            content_type: Some(detect_content_type(path).to_string()),
        })
    }
}
