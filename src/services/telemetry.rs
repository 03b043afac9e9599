//! Optional notification of successful extractions to an external collector.

use crate::models::{Record, TelemetryConfig};
use crate::utils::http::SharedFetcher;

/// Posts every successful record to a configured endpoint without waiting
/// for the answer.
#[derive(Clone)]
pub struct TelemetrySink {
    endpoint: Option<String>,
    token: Option<String>,
    fetcher: SharedFetcher,
}

impl TelemetrySink {
    pub fn new(config: &TelemetryConfig, fetcher: SharedFetcher) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
            fetcher,
        }
    }

    /// A sink that never sends anything.
    pub fn disabled(fetcher: SharedFetcher) -> Self {
        Self::new(&TelemetryConfig::default(), fetcher)
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Spawn the upload of `record` and return immediately. Failed records
    /// and a missing endpoint are ignored.
    pub fn notify(&self, record: &Record) {
        let Some(endpoint) = self.endpoint.clone() else {
            return;
        };
        if !record.success {
            return;
        }
        let body = match serde_json::to_value(record) {
            Ok(body) => body,
            Err(e) => {
                log::debug!("telemetry: cannot serialize {}/{}: {e}", record.site, record.sid);
                return;
            }
        };

        let fetcher = SharedFetcher::clone(&self.fetcher);
        let token = self.token.clone();
        let label = format!("{}/{}", record.site, record.sid);
        tokio::spawn(async move {
            match fetcher.post_json(&endpoint, token.as_deref(), &body).await {
                Ok(()) => log::debug!("telemetry: uploaded {label}"),
                Err(e) => log::debug!("telemetry: upload of {label} failed: {e}"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;
    use crate::utils::http::testing::StaticFetcher;

    const ENDPOINT: &str = "https://collector.example/save";

    fn enabled(fetcher: SharedFetcher) -> TelemetrySink {
        let config = TelemetryConfig {
            endpoint: Some(ENDPOINT.to_string()),
            token: Some("secret".to_string()),
        };
        TelemetrySink::new(&config, fetcher)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn posts_successful_records() {
        let fetcher = StaticFetcher::new().shared();
        let sink = enabled(fetcher.clone());

        sink.notify(&Record::new(Site::Douban, "1").succeed());
        settle().await;

        assert_eq!(fetcher.posted(), vec![ENDPOINT]);
    }

    #[tokio::test]
    async fn skips_failures() {
        let fetcher = StaticFetcher::new().shared();
        let sink = enabled(fetcher.clone());

        sink.notify(&Record::failure(Site::Douban, "1", "nope"));
        settle().await;

        assert!(fetcher.posted().is_empty());
    }

    #[tokio::test]
    async fn disabled_sink_sends_nothing() {
        let fetcher = StaticFetcher::new().shared();
        let sink = TelemetrySink::disabled(fetcher.clone());

        assert!(!sink.is_enabled());
        sink.notify(&Record::new(Site::Imdb, "tt1").succeed());
        settle().await;

        assert!(fetcher.posted().is_empty());
    }
}
