// src/services/registry.rs

//! Site registry: the single lookup from a site to its URL pattern, its
//! extractor and, when the site has one, its searcher.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{Bangumi, Douban, Epic, Extractor, Imdb, Indienova, Searcher, Steam};
use crate::models::{HttpConfig, Site};
use crate::utils::http::SharedFetcher;

static PATTERNS: LazyLock<Vec<(Site, Regex)>> = LazyLock::new(|| {
    Site::ALL
        .iter()
        .map(|site| (*site, Regex::new(site.pattern()).expect("valid site pattern")))
        .collect()
});

/// Match `url` against every site pattern in declared order and return the
/// first site with the id it captured.
pub fn resolve(url: &str) -> Option<(Site, String)> {
    PATTERNS.iter().find_map(|(site, pattern)| {
        pattern
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|id| (*site, id.as_str().to_string()))
    })
}

/// Everything the dispatcher needs for one site.
pub struct Source {
    pub site: Site,
    pub extractor: Arc<dyn Extractor>,
    pub searcher: Option<Arc<dyn Searcher>>,
}

impl Source {
    fn searchable<T: Extractor + Searcher + 'static>(site: Site, service: Arc<T>) -> Self {
        Self {
            site,
            extractor: service.clone(),
            searcher: Some(service as Arc<dyn Searcher>),
        }
    }

    fn extract_only(site: Site, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            site,
            extractor,
            searcher: None,
        }
    }
}

/// All supported sites.
pub struct Registry {
    sources: Vec<Source>,
}

impl Registry {
    /// Wire every site to `fetcher`.
    pub fn new(fetcher: SharedFetcher, http: &HttpConfig) -> Self {
        let douban = Arc::new(Douban::new(fetcher.clone(), http.douban_cookie.clone()));
        let imdb = Arc::new(Imdb::new(fetcher.clone()));
        let bangumi = Arc::new(Bangumi::new(fetcher.clone()));

        let sources = Site::ALL
            .iter()
            .map(|&site| match site {
                Site::Douban => Source::searchable(site, douban.clone()),
                Site::Imdb => Source::searchable(site, imdb.clone()),
                Site::Bangumi => Source::searchable(site, bangumi.clone()),
                Site::Steam => Source::extract_only(site, Arc::new(Steam::new(fetcher.clone()))),
                Site::Indienova => {
                    Source::extract_only(site, Arc::new(Indienova::new(fetcher.clone())))
                }
                Site::Epic => Source::extract_only(site, Arc::new(Epic::new(fetcher.clone()))),
            })
            .collect();

        Self { sources }
    }

    pub fn get(&self, site: Site) -> &Source {
        // Built from Site::ALL, so every site has an entry.
        &self.sources[site as usize]
    }

    /// Source named `name` (`douban`, `imdb`, ...).
    pub fn lookup(&self, name: &str) -> Option<&Source> {
        let site: Site = name.parse().ok()?;
        Some(self.get(site))
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.iter()
    }
}
