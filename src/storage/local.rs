//! Local filesystem cache backend.
//!
//! One JSON file per key under the root directory. Writes go to a temporary
//! file first and are renamed into place, so readers never see a partial
//! entry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{CacheEntry, CacheStore};

/// Local filesystem cache backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(AppError::storage(format!("invalid cache key '{key}'")));
        }
        Ok(self.root_dir.join(format!("{key}.json")))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path(key)?;
        let Some(bytes) = self.read_bytes(&path).await? else {
            return Ok(None);
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        if entry.is_expired() {
            log::debug!("Cache entry {key} expired at {}", entry.expires_at);
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let path = self.path(key)?;
        let entry = CacheEntry::new(value.clone(), ttl);
        let bytes = serde_json::to_vec(&entry)?;
        self.write_bytes(&path, &bytes).await?;
        log::debug!("Cached {key} until {}", entry.expires_at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(86_400);

    #[tokio::test]
    async fn put_then_get() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let body = json!({ "success": true, "format": "◎片　　名　寄生虫\n" });
        store.put("abc123", &body, DAY).await.unwrap();

        assert_eq!(store.get("abc123").await.unwrap(), Some(body));
        assert!(!tmp.path().join("abc123.tmp").exists());
    }

    #[tokio::test]
    async fn missing_key_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.put("stale", &json!(1), Duration::ZERO).await.unwrap();
        assert!(store.get("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), b"{not json").unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.get("bad").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creates_root_directory() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path().join("nested/cache"));

        store.put("k", &json!("v"), DAY).await.unwrap();
        assert!(tmp.path().join("nested/cache/k.json").exists());
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        assert!(store.put("../escape", &json!(1), DAY).await.is_err());
        assert!(store.get("").await.is_err());
    }
}
