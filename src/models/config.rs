//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name shown in internal-error messages
    #[serde(default = "defaults::author")]
    pub author: String,

    /// Upstream HTTP behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Secondary result cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Optional extraction telemetry sink
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply `PTGEN_*` environment overrides on top of the file values.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok());
        self
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(author) = lookup("PTGEN_AUTHOR") {
            self.author = author;
        }
        if let Some(cookie) = lookup("PTGEN_DOUBAN_COOKIE") {
            self.http.douban_cookie = Some(cookie);
        }
        if let Some(dir) = lookup("PTGEN_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(endpoint) = lookup("PTGEN_TELEMETRY_ENDPOINT") {
            self.telemetry.endpoint = Some(endpoint);
        }
        if let Some(token) = lookup("PTGEN_TELEMETRY_TOKEN") {
            self.telemetry.token = Some(token);
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.author.trim().is_empty() {
            return Err(AppError::validation("author is empty"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == Some(0) {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if self.cache.enabled
            && self.cache.backend == CacheBackend::S3
            && self.cache.bucket.trim().is_empty()
        {
            return Err(AppError::validation("cache.bucket is empty"));
        }
        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(AppError::validation(format!(
                "server.bind '{}' is not a socket address",
                self.server.bind
            )));
        }
        if let Some(endpoint) = &self.telemetry.endpoint {
            url::Url::parse(endpoint)?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            author: defaults::author(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Upstream HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds; requests wait indefinitely when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Cookie sent with every Douban request
    #[serde(default)]
    pub douban_cookie: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: None,
            douban_cookie: None,
        }
    }
}

/// Where cached results are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Local,
    S3,
}

/// Secondary cache for successful generations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// Root directory of the local backend
    #[serde(default = "defaults::cache_dir")]
    pub dir: PathBuf,

    /// Entry lifetime in seconds
    #[serde(default = "defaults::cache_ttl")]
    pub ttl_secs: u64,

    /// Bucket of the S3 backend
    #[serde(default = "defaults::bucket")]
    pub bucket: String,

    /// Key prefix of the S3 backend
    #[serde(default = "defaults::prefix")]
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackend::default(),
            dir: defaults::cache_dir(),
            ttl_secs: defaults::cache_ttl(),
            bucket: defaults::bucket(),
            prefix: defaults::prefix(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::bind(),
        }
    }
}

/// Endpoint notified after each successful generation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent with each notification
    #[serde(default)]
    pub token: Option<String>,
}

mod defaults {
    use std::path::PathBuf;

    pub fn author() -> String {
        "ptgen".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into()
    }

    // Cache defaults
    pub fn cache_dir() -> PathBuf {
        PathBuf::from("storage/cache")
    }
    pub fn cache_ttl() -> u64 {
        86400 * 2
    }
    pub fn bucket() -> String {
        "ptgen-cache".into()
    }
    pub fn prefix() -> String {
        "ptgen".into()
    }

    // Server defaults
    pub fn bind() -> String {
        "0.0.0.0:3000".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.http.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_bind_address() {
        let mut config = Config::default();
        config.server.bind = "localhost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_cache_lives_two_days() {
        assert_eq!(Config::default().cache.ttl_secs, 172_800);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            author = "someone"

            [cache]
            enabled = true
            backend = "s3"
            "#,
        )
        .unwrap();

        assert_eq!(config.author, "someone");
        assert!(config.cache.enabled);
        assert_eq!(config.cache.backend, CacheBackend::S3);
        assert_eq!(config.cache.ttl_secs, 172_800);
        assert!(config.http.timeout_secs.is_none());
    }

    #[test]
    fn sample_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../../storage/config.toml")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_secs, Config::default().cache.ttl_secs);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "PTGEN_DOUBAN_COOKIE" => Some("bid=abc".to_string()),
            "PTGEN_AUTHOR" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(config.http.douban_cookie.as_deref(), Some("bid=abc"));
        assert_eq!(config.author, "ptgen");
    }
}
