//! Object storage for uploaded and generated images

pub mod base64;
pub mod file;

use async_trait::async_trait;

use crate::error::Result;

pub use file::FileStorage;

/// Stores image bytes and hands back a public URL
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn put(&self, bytes: &[u8], filename: &str) -> Result<String>;

    /// Decode base64 (or a `data:` URL) and store it. A filename without
    /// an extension takes the one named in the data URL header.
    async fn put_base64(&self, encoded: &str, filename: &str) -> Result<String> {
        let bytes = base64::decode(encoded)?;
        match base64::data_url_format(encoded) {
            Some(format) if !filename.contains('.') => {
                self.put(&bytes, &format!("{}.{}", filename, format)).await
            }
            _ => self.put(&bytes, filename).await,
        }
    }
}
