// src/utils/http.rs

//! HTTP client utilities.
//!
//! Every upstream request goes through the [`Fetcher`] trait so extractors can
//! be driven against captured pages in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// A GET request to an upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub cookie: Option<String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cookie: None,
        }
    }

    /// Attach a `Cookie` header value.
    pub fn cookie(mut self, cookie: Option<impl Into<String>>) -> Self {
        self.cookie = cookie.map(Into::into);
        self
    }
}

/// A fetched upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Source of upstream pages.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request. Non-2xx statuses are returned as pages, only
    /// transport failures are errors.
    async fn fetch(&self, request: Request) -> Result<Page>;

    /// POST a JSON body, ignoring the answer.
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<()>;
}

/// Shared handle to a fetcher.
pub type SharedFetcher = Arc<dyn Fetcher>;

/// [`Fetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: Request) -> Result<Page> {
        log::debug!("GET {}", request.url);

        let mut builder = self.client.get(&request.url);
        if let Some(cookie) = &request.cookie {
            let mut headers = HeaderMap::new();
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| AppError::config(format!("invalid cookie value: {e}")))?;
            headers.insert(COOKIE, value);
            builder = builder.headers(headers);
        }

        let response = builder.send().await?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let body = response.text().await?;

        log::debug!("GET {} -> {} ({} bytes)", request.url, status, body.len());
        Ok(Page { url, status, body })
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
    ) -> Result<()> {
        let mut builder = self.client.post(url).json(body);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder.send().await?.error_for_status()?;
        Ok(())
    }
}

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(&config.user_agent);
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_without_timeout() {
        assert!(create_async_client(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn request_keeps_cookie() {
        let request = Request::get("https://movie.douban.com/").cookie(Some("bid=1"));
        assert_eq!(request.cookie.as_deref(), Some("bid=1"));

        let request = Request::get("https://movie.douban.com/").cookie(None::<String>);
        assert!(request.cookie.is_none());
    }

    #[test]
    fn page_status_classification() {
        let page = Page {
            url: "u".to_string(),
            status: 404,
            body: String::new(),
        };
        assert!(!page.is_success());
    }
}
