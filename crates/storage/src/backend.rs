use crate::StorageResult;
use async_trait::async_trait;
use std::path::Path;

/// Raw bytes of a stored object plus the content type it was stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl StoredObject {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Stored content type, or one derived from `path` when none was recorded.
    pub fn content_type_or_guess(&self, path: &str) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| detect_content_type(path).to_string())
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Fetch an object by key. A missing key is [`crate::StorageError::NotFound`].
    async fn retrieve(&self, path: &str) -> StorageResult<StoredObject>;
}

/// Content type from a key's extension.
pub fn detect_content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}
