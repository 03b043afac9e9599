//! AWS S3 cache backend.
//!
//! Entries live at `{bucket}/{prefix}/{key}.json` in the same envelope the
//! local backend writes.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::storage::{CacheEntry, CacheStore};

/// S3-based cache backend.
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Build a client from the ambient AWS configuration.
    pub async fn from_env(bucket: &str, prefix: &str) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    fn object_key(&self, key: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            format!("{key}.json")
        } else {
            format!("{prefix}/{key}.json")
        }
    }
}

#[async_trait]
impl CacheStore for S3Store {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let object_key = self.object_key(key);
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::debug!("Cache miss s3://{}/{}", self.bucket, object_key);
                    return Ok(None);
                }
                return Err(AppError::storage(service_err));
            }
        };

        let bytes = output.body.collect().await.map_err(AppError::storage)?;
        let entry: CacheEntry = match serde_json::from_slice(&bytes.into_bytes()) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Ignoring unreadable s3://{}/{}: {}", self.bucket, object_key, e);
                return Ok(None);
            }
        };
        if entry.is_expired() {
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn put(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let object_key = self.object_key(key);
        let entry = CacheEntry::new(value.clone(), ttl);
        let body = ByteStream::from(serde_json::to_vec(&entry)?);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .body(body)
            .content_type("application/json")
            .send()
            .await
            .map_err(AppError::storage)?;

        log::debug!("Cached s3://{}/{}", self.bucket, object_key);
        Ok(())
    }
}
