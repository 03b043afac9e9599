//! Service layer of the generator.
//!
//! This module contains one extractor per catalog site, the keyword searchers
//! of the sites that offer one, the registry tying sites to both, and the
//! selector engine the HTML extractors share.

mod bangumi;
mod douban;
mod epic;
mod imdb;
mod indienova;
mod registry;
pub mod selectors;
mod steam;
mod telemetry;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Record, SearchOutcome};
use crate::utils::http::{Page, Request, SharedFetcher};

pub use bangumi::Bangumi;
pub use douban::Douban;
pub use epic::Epic;
pub use imdb::Imdb;
pub use indienova::Indienova;
pub use registry::{Registry, Source, resolve};
pub use steam::Steam;
pub use telemetry::TelemetrySink;

/// Error of a record whose item does not exist upstream.
pub const NOT_FOUND: &str = "The corresponding resource does not exist.";

/// Turns one site's pages into a [`Record`].
///
/// Outcomes the upstream reports (missing item, throttling) come back as a
/// failed record. `Err` is reserved for failures nobody anticipated.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, sid: &str) -> Result<Record>;
}

/// Keyword search over one site. Never fails: upstream problems become a
/// failed outcome with a fixed message.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, query: &str) -> SearchOutcome;
}

/// Start a fetch on its own task so it overlaps with parsing.
pub(crate) fn spawn_fetch(fetcher: &SharedFetcher, request: Request) -> JoinHandle<Result<Page>> {
    let fetcher = SharedFetcher::clone(fetcher);
    tokio::spawn(async move { fetcher.fetch(request).await })
}

/// Reject non-2xx pages.
pub(crate) fn expect_success(page: Page) -> Result<Page> {
    if page.is_success() {
        Ok(page)
    } else {
        Err(AppError::Upstream {
            url: page.url,
            status: page.status,
        })
    }
}
