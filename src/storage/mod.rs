//! Object storage for uploaded trip photos.
//!
//! The trip service only needs `put`: store the bytes, hand back a public URL.
//! The URL is opaque to callers and is appended to a trip's photo list as is.

pub mod supabase;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

pub use supabase::SupabaseStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Missing storage configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Upload failed with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` and return the URL they are publicly served from.
    /// Called once per file; failures are not retried.
    async fn put(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<String, StorageError>;
}

/// Object key for an upload: millisecond timestamp, a random suffix, then
/// the client's filename with anything outside `[A-Za-z0-9._-]` replaced.
pub fn object_key(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = if cleaned.is_empty() { "file.bin".to_string() } else { cleaned };

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        &suffix[..8],
        cleaned
    )
}

/// A stored object, kept for inspection by tests
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub key: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps uploads in process. Used when no Supabase URL is configured.
///
/// Objects are held until the process exits and nothing is ever evicted, so
/// this is for tests and local development, not long-running deployments.
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<Vec<StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(Vec::new()),
        }
    }

    pub async fn objects(&self) -> Vec<StoredObject> {
        self.objects.read().await.clone()
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory://trips-photo")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        filename: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(filename);
        let url = format!("{}/{}", self.base_url, key);
        tracing::debug!("Stored {} bytes in memory as {}", bytes.len(), key);

        self.objects.write().await.push(StoredObject {
            key,
            content_type: content_type.to_string(),
            bytes,
        });
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keys_keep_a_safe_filename() {
        let key = object_key("beach day.jpg");
        assert!(key.ends_with("_beach_day.jpg"), "{}", key);
        assert_eq!(key.split('_').count(), 4);

        assert!(object_key("   ").ends_with("_file.bin"));
        assert!(object_key("../../etc/passwd").ends_with("_.._.._etc_passwd"));
    }

    #[test]
    fn object_keys_differ_for_the_same_name() {
        assert_ne!(object_key("a.jpg"), object_key("a.jpg"));
    }

    #[tokio::test]
    async fn memory_store_returns_url_under_base() {
        let store = MemoryObjectStore::new("http://files.test/");
        let url = store.put(b"jpeg".to_vec(), "image/jpeg", "a.jpg").await.unwrap();

        assert!(url.starts_with("http://files.test/"));
        assert!(url.ends_with("_a.jpg"));

        let objects = store.objects().await;
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].content_type, "image/jpeg");
        assert_eq!(objects[0].bytes, b"jpeg");
    }
}
