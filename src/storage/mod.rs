//! Secondary cache for generated responses.
//!
//! Successful generations are stored under a fingerprint of `site` and `sid`
//! for a fixed lifetime, so a repeated request skips the upstream entirely.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── {fingerprint}.json    # { "expires_at": ..., "value": {...} }
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{CacheBackend, CacheConfig, Site};

pub use local::LocalStore;
#[cfg(feature = "s3")]
pub use s3::S3Store;

/// Key of the cached body for one item.
pub fn fingerprint(site: Site, sid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(site.as_str().as_bytes());
    hasher.update(sid.as_bytes());
    hex::encode(hasher.finalize())
}

/// A stored body with its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub expires_at: DateTime<Utc>,
    pub value: Value,
}

impl CacheEntry {
    /// Entry expiring `ttl` from now.
    pub fn new(value: Value, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self {
            expires_at: Utc::now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            value,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Key/value store for response bodies.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Stored body for `key`; expired entries read as a miss.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key` for `ttl`.
    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;
}

/// Shared handle to a cache backend.
pub type SharedStore = Arc<dyn CacheStore>;

/// Open the backend `config` selects, or `None` when caching is off.
pub async fn open_store(config: &CacheConfig) -> Result<Option<SharedStore>> {
    if !config.enabled {
        return Ok(None);
    }
    match config.backend {
        CacheBackend::Local => {
            log::info!("Cache: local directory {}", config.dir.display());
            Ok(Some(Arc::new(LocalStore::new(&config.dir))))
        }
        #[cfg(feature = "s3")]
        CacheBackend::S3 => {
            log::info!("Cache: s3://{}/{}", config.bucket, config.prefix);
            Ok(Some(Arc::new(
                S3Store::from_env(&config.bucket, &config.prefix).await,
            )))
        }
        #[cfg(not(feature = "s3"))]
        CacheBackend::S3 => Err(crate::error::AppError::config(
            "cache.backend = \"s3\" requires the `s3` feature",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_sha256_hex_of_site_and_sid() {
        let key = fingerprint(Site::Douban, "1292052");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let mut hasher = Sha256::new();
        hasher.update(b"douban1292052");
        assert_eq!(key, hex::encode(hasher.finalize()));
    }

    #[test]
    fn fingerprint_differs_per_site() {
        assert_ne!(fingerprint(Site::Douban, "1"), fingerprint(Site::Bangumi, "1"));
    }

    #[test]
    fn entry_expiry() {
        let fresh = CacheEntry::new(Value::Null, Duration::from_secs(60));
        assert!(!fresh.is_expired());

        let stale = CacheEntry {
            expires_at: Utc::now() - chrono::Duration::seconds(1),
            value: Value::Null,
        };
        assert!(stale.is_expired());
    }

    #[tokio::test]
    async fn disabled_cache_opens_nothing() {
        let store = open_store(&CacheConfig::default()).await.unwrap();
        assert!(store.is_none());
    }
}
