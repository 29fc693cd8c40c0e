//! Local filesystem storage served under a URL prefix

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::storage::StorageAdapter;

/// Writes objects to a directory; URLs are `{url_prefix}/{object name}`
pub struct FileStorage {
    base_path: PathBuf,
    url_prefix: String,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    async fn ensure_storage_dir(&self) -> Result<()> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)
                .await
                .map_err(|e| AppError::Storage(format!("Cannot create storage directory: {}", e)))?;
            debug!(path = ?self.base_path, "Created storage directory");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for FileStorage {
    async fn put(&self, bytes: &[u8], filename: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::Validation("File data is empty".to_string()));
        }
        self.ensure_storage_dir().await?;

        let object_name = object_name(filename, bytes);
        let path = self.base_path.join(&object_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot write {}: {}", object_name, e)))?;

        debug!(path = ?path, size = bytes.len(), "Stored object");
        Ok(format!("{}/{}", self.url_prefix, object_name))
    }
}

/// Unique object name keeping a sanitized form of the caller's filename.
/// Falls back to an extension sniffed from the bytes when none is given.
fn object_name(filename: &str, bytes: &[u8]) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    let sanitized: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let sanitized = sanitized.trim_matches('.');

    let id = Uuid::new_v4();
    if sanitized.is_empty() {
        format!("{}.{}", id, detect_image_format(bytes).unwrap_or("bin"))
    } else if !sanitized.contains('.') {
        match detect_image_format(bytes) {
            Some(ext) => format!("{}-{}.{}", id, sanitized, ext),
            None => format!("{}-{}", id, sanitized),
        }
    } else {
        format!("{}-{}", id, sanitized)
    }
}

/// Detect image format from magic bytes
fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }
    None
}
