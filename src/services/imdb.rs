//! IMDb title extractor and suggestion search.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::selectors::Document;
use super::{Extractor, NOT_FOUND, Searcher, expect_success};
use crate::error::{AppError, Result};
use crate::models::{
    Field, Record, Role, SearchOutcome, SearchResult, SelectorTable, Site, Strategy,
};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::json::{count, names_at, number, parse_jsonp, parse_ld_json, str_at, strings_at};
use crate::utils::normalize::{decode_entities, sort_locale, sort_release_dates};
use crate::utils::with_path_segment;

pub const SEARCH_FAILED: &str = "IMDb搜索失败";

const SUGGEST_BASE: &str = "https://v2.sg.media-imdb.com/suggests";

static TABLE: SelectorTable = &[
    (
        Field::StructuredData,
        Strategy::InnerHtml(r#"script[type="application/ld+json"]"#),
    ),
    (
        Field::Regions,
        Strategy::Texts(r#"li[data-testid="title-details-origin"] a"#),
    ),
    (
        Field::Languages,
        Strategy::Texts(r#"li[data-testid="title-details-languages"] a"#),
    ),
    (
        Field::Aka,
        Strategy::Texts(
            r#"li[data-testid="title-details-akas"] .ipc-metadata-list-item__list-content-item"#,
        ),
    ),
    (
        Field::OfficialSite,
        Strategy::Attr {
            selector: r#"li[data-testid="details-officialsites"] a[href]"#,
            attr: "href",
        },
    ),
];

static ISO_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").expect("valid regex"));

/// IMDb extractor and searcher.
pub struct Imdb {
    fetcher: SharedFetcher,
}

impl Imdb {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }

    async fn suggest(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = suggest_url(query)?;
        let page = expect_success(self.fetcher.fetch(Request::get(url)).await?)?;
        let payload: Suggestions = serde_json::from_value(parse_jsonp(&page.body)?)?;

        Ok(payload
            .d
            .into_iter()
            .filter(|s| s.id.starts_with("tt"))
            .map(Suggestion::into_result)
            .collect())
    }
}

#[async_trait]
impl Extractor for Imdb {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let link = Site::Imdb.item_link(sid);
        let page = self.fetcher.fetch(Request::get(&link)).await?;

        if page.status == 404 {
            log::info!("imdb {sid}: not found");
            return Ok(Record::failure(Site::Imdb, sid, NOT_FOUND));
        }
        let page = expect_success(page)?;

        let record = parse_title(sid, &link, &page.body)?;
        log::debug!("imdb {sid}: extracted");
        Ok(record.succeed())
    }
}

#[async_trait]
impl Searcher for Imdb {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.suggest(query).await {
            Ok(results) => SearchOutcome::found(results),
            Err(e) => {
                log::warn!("imdb search {query:?} failed: {e}");
                SearchOutcome::failed(SEARCH_FAILED)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Suggestions {
    #[serde(default)]
    d: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    id: String,
    #[serde(default)]
    l: String,
    #[serde(default)]
    q: String,
    #[serde(default)]
    s: String,
    #[serde(default)]
    y: Option<Value>,
}

impl Suggestion {
    fn into_result(self) -> SearchResult {
        let year = match self.y {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s,
            _ => String::new(),
        };
        SearchResult {
            year,
            subtype: self.q,
            title: self.l,
            subtitle: self.s,
            link: Site::Imdb.item_link(&self.id),
        }
    }
}

/// `{base}/{first letter}/{query}.json`, both segments percent-encoded.
fn suggest_url(query: &str) -> Result<String> {
    let query = query.trim();
    let first = query
        .chars()
        .next()
        .ok_or_else(|| AppError::validation("empty search query"))?
        .to_lowercase()
        .to_string();

    let prefix = with_path_segment(SUGGEST_BASE, &first)?;
    with_path_segment(&prefix, &format!("{query}.json"))
}

/// `PT2H22M` → `2h 22m`. Unrecognized values are kept as they are.
fn format_duration(iso: &str) -> String {
    let Some(caps) = ISO_DURATION.captures(iso) else {
        return iso.to_string();
    };
    let hours = caps.get(1).map(|m| format!("{}h", m.as_str()));
    let minutes = caps.get(2).map(|m| format!("{}m", m.as_str()));
    let parts: Vec<String> = hours.into_iter().chain(minutes).collect();
    if parts.is_empty() {
        iso.to_string()
    } else {
        parts.join(" ")
    }
}

fn parse_title(sid: &str, link: &str, body: &str) -> Result<Record> {
    let doc = Document::parse(body);
    let ld = parse_ld_json(doc.value(TABLE, Field::StructuredData)?.as_deref())?;
    let mut record = Record::new(Site::Imdb, sid);
    record.link = Some(link.to_string());

    record.kind = str_at(&ld, "@type");
    record.this_title = str_at(&ld, "name")
        .map(|n| decode_entities(&n))
        .into_iter()
        .collect();
    record.aka = doc.values(TABLE, Field::Aka)?;
    sort_locale(&mut record.aka);
    record.genres = strings_at(&ld, "genre");
    record.release_dates = strings_at(&ld, "datePublished");
    sort_release_dates(&mut record.release_dates);
    record.year = record
        .release_dates
        .first()
        .map(|d| d.chars().take(4).collect());
    record.runtime = str_at(&ld, "duration").map(|d| format_duration(&d));
    record.content_rating = str_at(&ld, "contentRating");
    record.poster = str_at(&ld, "image");
    record.synopsis = str_at(&ld, "description").map(|d| decode_entities(&d));
    record.regions = doc.values(TABLE, Field::Regions)?;
    record.languages = doc.values(TABLE, Field::Languages)?;
    record.official_site = doc.value(TABLE, Field::OfficialSite)?;
    record.tags = str_at(&ld, "keywords")
        .map(|k| {
            k.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(decode_entities)
                .collect()
        })
        .unwrap_or_default();

    if let Some(aggregate) = ld.get("aggregateRating") {
        record.push_rating(
            Site::Imdb,
            number(aggregate.get("ratingValue")).unwrap_or(0.0),
            count(aggregate.get("ratingCount")).unwrap_or(0),
        );
    }

    record.push_credit(Role::Director, names_at(&ld, "director"));
    record.push_credit(Role::Creator, names_at(&ld, "creator"));
    record.push_credit(Role::Cast, names_at(&ld, "actor"));
    Ok(record)
}
