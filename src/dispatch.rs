// src/dispatch.rs

//! Request dispatch for `/api/gen`.
//!
//! Turns the query parameters of one request into a JSON body:
//! 1. `search` → keyword search on `source` (default `douban`)
//! 2. `url`, or `site` + `sid` → secondary cache, then extraction
//! 3. successful records get the rendered `format` text, are cached and
//!    reported to the telemetry sink
//!
//! Every outcome, including failures, is answered with status 200.

use std::collections::HashMap;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::format::format;
use crate::models::{Config, Site};
use crate::services::{Registry, TelemetrySink, resolve};
use crate::storage::{SharedStore, fingerprint, open_store};
use crate::utils::http::{HttpFetcher, SharedFetcher};

pub const UNKNOWN_SOURCE: &str = "Unknown value of key `source`.";
pub const UNKNOWN_SITE: &str = "Unknown value of key `site`.";
pub const MISSING_PARAMS: &str =
    "Miss key of `site` or `sid` , or input unsupported resource `url`.";

/// Methods the endpoint answers.
pub const ALLOW_METHODS: &str = "GET,HEAD,OPTIONS";
/// Request headers accepted on cross-origin calls.
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers, Origin,Accept, X-Requested-With, Content-Type, Access-Control-Request-Method, Access-Control-Request-Headers";

/// Status and JSON body of one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// Headers answering an `OPTIONS` request. A CORS preflight carries
/// `Origin`, `Access-Control-Request-Method` and
/// `Access-Control-Request-Headers`; anything else only learns the allowed
/// methods.
pub fn options_headers(preflight: bool) -> Vec<(&'static str, &'static str)> {
    if preflight {
        vec![
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Credentials", "true"),
            ("Access-Control-Allow-Methods", ALLOW_METHODS),
            ("Access-Control-Allow-Headers", ALLOW_HEADERS),
        ]
    } else {
        vec![("Allow", "GET, HEAD, OPTIONS")]
    }
}

/// Routes requests to searchers and extractors.
pub struct Dispatcher {
    registry: Registry,
    cache: Option<SharedStore>,
    cache_ttl: Duration,
    telemetry: TelemetrySink,
    author: String,
}

impl Dispatcher {
    pub fn new(registry: Registry, telemetry: TelemetrySink, author: impl Into<String>) -> Self {
        Self {
            registry,
            cache: None,
            cache_ttl: Duration::ZERO,
            telemetry,
            author: author.into(),
        }
    }

    /// Keep successful bodies in `store` for `ttl`.
    pub fn with_cache(mut self, store: SharedStore, ttl: Duration) -> Self {
        self.cache = Some(store);
        self.cache_ttl = ttl;
        self
    }

    /// Wire the HTTP client, the registry, the cache and telemetry from
    /// `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let fetcher: SharedFetcher = Arc::new(HttpFetcher::new(&config.http)?);
        let registry = Registry::new(SharedFetcher::clone(&fetcher), &config.http);
        let telemetry = TelemetrySink::new(&config.telemetry, fetcher);

        let dispatcher = Self::new(registry, telemetry, &config.author);
        Ok(match open_store(&config.cache).await? {
            Some(store) => {
                dispatcher.with_cache(store, Duration::from_secs(config.cache.ttl_secs))
            }
            None => dispatcher,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Answer one `/api/gen` request.
    pub async fn handle(&self, params: &HashMap<String, String>) -> ApiResponse {
        let param = |key: &str| params.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let result = match param("search") {
            Some(query) => self.search(query, param("source").unwrap_or("douban")).await,
            None => match self.target(param("url"), param("site"), param("sid")) {
                Ok((site, sid)) => self.generate(site, &sid).await,
                Err(message) => Ok(failure(message)),
            },
        };

        match result {
            Ok(body) => ApiResponse::ok(body),
            Err(e) => {
                log::error!("Request {:?} failed: {}", params, e);
                ApiResponse::ok(self.internal_error(&e, params, param("debug") == Some("1")))
            }
        }
    }

    async fn search(&self, query: &str, source: &str) -> Result<Value> {
        let Some(entry) = self.registry.lookup(source) else {
            return Ok(failure(UNKNOWN_SOURCE));
        };
        let Some(searcher) = &entry.searcher else {
            return Ok(failure(&format!(
                "Miss search function for `source`: {source}."
            )));
        };

        log::info!("Searching {source} for {query:?}");
        Ok(serde_json::to_value(searcher.search(query).await)?)
    }

    /// Site and id named by the request, or the message explaining why
    /// there is none.
    fn target(
        &self,
        url: Option<&str>,
        site: Option<&str>,
        sid: Option<&str>,
    ) -> std::result::Result<(Site, String), &'static str> {
        if let Some(url) = url {
            return resolve(url).ok_or(MISSING_PARAMS);
        }
        let (Some(site), Some(sid)) = (site, sid) else {
            return Err(MISSING_PARAMS);
        };
        let site: Site = site.parse().map_err(|_| UNKNOWN_SITE)?;
        Ok((site, sid.to_string()))
    }

    /// Body for `site`/`sid`, from the cache when a fresh entry exists.
    pub async fn generate(&self, site: Site, sid: &str) -> Result<Value> {
        let key = fingerprint(site, sid);
        if let Some(cache) = &self.cache {
            match cache.get(&key).await {
                Ok(Some(body)) => {
                    log::info!("{site}/{sid}: served from cache");
                    return Ok(body);
                }
                Ok(None) => {}
                Err(e) => log::warn!("{site}/{sid}: cache lookup failed: {e}"),
            }
        }

        log::info!("{site}/{sid}: extracting");
        let record = self.registry.get(site).extractor.extract(sid).await?;
        let mut body = serde_json::to_value(&record)?;
        if !record.success {
            log::info!(
                "{site}/{sid}: {}",
                record.error.as_deref().unwrap_or("unsuccessful")
            );
            return Ok(body);
        }

        if let Some(object) = body.as_object_mut() {
            object.insert("format".to_string(), Value::String(format(&record)));
        }
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &body, self.cache_ttl).await {
                log::warn!("{site}/{sid}: cache store failed: {e}");
            }
        }
        self.telemetry.notify(&record);
        Ok(body)
    }

    fn internal_error(&self, err: &AppError, params: &HashMap<String, String>, debug: bool) -> Value {
        let mut body = failure(&format!(
            "Internal Error, Please contact @{}.",
            self.author
        ));
        if debug {
            let mut causes = Vec::new();
            let mut source = err.source();
            while let Some(cause) = source {
                causes.push(cause.to_string());
                source = cause.source();
            }
            body["debug"] = json!({
                "error": err.to_string(),
                "kind": err.kind(),
                "causes": causes,
                "params": params,
            });
        }
        body
    }
}

fn failure(message: &str) -> Value {
    json!({ "success": false, "error": message })
}
