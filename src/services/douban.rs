// src/services/douban.rs

//! Douban movie/TV extractor and keyword search.
//!
//! The subject page is fetched first and classified. Only a real item page
//! triggers the awards sub-page and the IMDb rating lookup; both run on their
//! own tasks while the subject page is parsed and are awaited where their data
//! is merged.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::selectors::Document;
use super::{Extractor, NOT_FOUND, Searcher, expect_success, spawn_fetch};
use crate::error::Result;
use crate::models::{
    CrossRef, Field, Record, Role, SearchOutcome, SearchResult, SelectorTable, Site, Strategy,
};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::json::{count, names_at, number, parse_jsonp, parse_ld_json, str_at};
use crate::utils::normalize::{
    html_block_to_text, non_empty, normalize_lines, sort_locale, sort_release_dates, split_multi,
};

/// Error of a record when Douban throttles the generator.
pub const BLOCKED: &str = "GenHelp was temporary banned by Douban, Please wait....";
/// Error of a failed keyword search.
pub const SEARCH_FAILED: &str = "豆瓣搜索失败";

const NOT_FOUND_SIGNATURE: &str = "你想访问的页面不存在";
const BLOCKED_SIGNATURE: &str = "检测到有异常请求";
const NO_SYNOPSIS: &str = "暂无相关剧情介绍";
const TITLE_SUFFIX: &str = "(豆瓣)";
const RUNTIME_PROPERTY: &str = r#"#info span[property="v:runtime"]"#;
const SUGGEST_URL: &str = "https://movie.douban.com/j/subject_suggest";

const INFO: &str = "#info span.pl";

static TABLE: SelectorTable = &[
    (Field::Title, Strategy::Texts("title")),
    (
        Field::OriginalTitle,
        Strategy::Texts(r#"span[property="v:itemreviewed"]"#),
    ),
    (Field::Aka, Strategy::Label { anchor: INFO, label: "又名" }),
    (Field::Year, Strategy::Texts("#content > h1 > span.year")),
    (
        Field::Regions,
        Strategy::Label {
            anchor: INFO,
            label: "制片国家/地区",
        },
    ),
    (
        Field::Genres,
        Strategy::Texts(r#"#info span[property="v:genre"]"#),
    ),
    (Field::Languages, Strategy::Label { anchor: INFO, label: "语言" }),
    (
        Field::ReleaseDates,
        Strategy::Texts(r#"#info span[property="v:initialReleaseDate"]"#),
    ),
    (Field::Episodes, Strategy::Label { anchor: INFO, label: "集数" }),
    (Field::Runtime, Strategy::Label { anchor: INFO, label: "单集片长" }),
    (
        Field::OfficialSite,
        Strategy::Attr {
            selector: "#info > a[href]",
            attr: "href",
        },
    ),
    (Field::CrossRefId, Strategy::Label { anchor: INFO, label: "IMDb" }),
    (
        Field::Synopsis,
        Strategy::FirstOf(&[
            "#link-report-intra > span.all.hidden",
            "#link-report > span.all.hidden",
            r#"#link-report-intra > [property="v:summary"]"#,
            r#"#link-report > [property="v:summary"]"#,
        ]),
    ),
    (Field::Tags, Strategy::Texts(r#"div.tags-body > a[href^="/tag"]"#)),
    (
        Field::StructuredData,
        Strategy::InnerHtml(r#"head > script[type="application/ld+json"]"#),
    ),
    (Field::Awards, Strategy::InnerHtml("#content > div > div.article")),
];

static SMALL_POSTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"s(_ratio_poster|pic)").expect("valid regex"));

/// Douban extractor and searcher.
pub struct Douban {
    fetcher: SharedFetcher,
    cookie: Option<String>,
}

impl Douban {
    pub fn new(fetcher: SharedFetcher, cookie: Option<String>) -> Self {
        Self { fetcher, cookie }
    }

    fn request(&self, url: impl Into<String>) -> Request {
        Request::get(url).cookie(self.cookie.clone())
    }

    async fn suggest(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = url::Url::parse_with_params(SUGGEST_URL, [("q", query)])?;
        let page = expect_success(self.fetcher.fetch(self.request(url.as_str())).await?)?;
        let items: Vec<Suggestion> = page.json()?;
        Ok(items.into_iter().map(Suggestion::into_result).collect())
    }
}

#[async_trait]
impl Extractor for Douban {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let link = Site::Douban.item_link(sid);
        let page = self.fetcher.fetch(self.request(&link)).await?;

        if let Some(error) = classify(&page.body) {
            log::info!("douban {sid}: {error}");
            return Ok(Record::failure(Site::Douban, sid, error));
        }

        let awards = spawn_fetch(&self.fetcher, self.request(format!("{link}awards")));
        let (mut record, imdb_id) = parse_subject(sid, &link, &page.body)?;
        let rating = imdb_id
            .as_deref()
            .map(|id| spawn_fetch(&self.fetcher, Request::get(imdb_ratings_url(id))));

        let awards_page = awards.await??;
        record.awards = parse_awards(&awards_page.body)?;

        if let Some(rating) = rating {
            match rating.await? {
                Ok(page) if page.is_success() => {
                    if let Some((score, votes)) = parse_imdb_rating(&page.body) {
                        record.push_rating(Site::Imdb, score, votes);
                    }
                }
                Ok(page) => log::debug!("imdb rating lookup answered {}", page.status),
                Err(e) => log::warn!("imdb rating lookup for douban {sid} failed: {e}"),
            }
        }

        log::debug!("douban {sid}: extracted");
        Ok(record.succeed())
    }
}

#[async_trait]
impl Searcher for Douban {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.suggest(query).await {
            Ok(results) => SearchOutcome::found(results),
            Err(e) => {
                log::warn!("douban search {query:?} failed: {e}");
                SearchOutcome::failed(SEARCH_FAILED)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    sub_title: String,
    #[serde(default)]
    year: String,
    #[serde(default, rename = "type")]
    kind: String,
}

impl Suggestion {
    fn into_result(self) -> SearchResult {
        SearchResult {
            year: self.year,
            subtype: self.kind,
            title: self.title,
            subtitle: self.sub_title,
            link: Site::Douban.item_link(&self.id),
        }
    }
}

/// Error message of a page that is not an item page.
fn classify(body: &str) -> Option<&'static str> {
    if body.contains(NOT_FOUND_SIGNATURE) {
        Some(NOT_FOUND)
    } else if body.contains(BLOCKED_SIGNATURE) {
        Some(BLOCKED)
    } else {
        None
    }
}

fn imdb_ratings_url(id: &str) -> String {
    format!(
        "https://p.media-imdb.com/static-content/documents/v1/title/{id}/ratings%3Fjsonp=imdb.rating.run:imdb.api.title.ratings/data.json"
    )
}

/// Everything the subject page yields, plus the IMDb id to look up.
fn parse_subject(sid: &str, link: &str, body: &str) -> Result<(Record, Option<String>)> {
    let doc = Document::parse(body);
    let ld = parse_ld_json(doc.value(TABLE, Field::StructuredData)?.as_deref())?;
    let mut record = Record::new(Site::Douban, sid);
    record.link = Some(link.to_string());

    let chinese = doc
        .value(TABLE, Field::Title)?
        .map(|t| t.replace(TITLE_SUFFIX, "").trim().to_string())
        .unwrap_or_default();
    let foreign = doc
        .value(TABLE, Field::OriginalTitle)?
        .and_then(|t| non_empty(t.replace(&chinese, "")));
    let mut aka = doc
        .value(TABLE, Field::Aka)?
        .map(|v| split_multi(&v))
        .unwrap_or_default();
    sort_locale(&mut aka);

    match foreign.filter(|f| *f != chinese) {
        Some(foreign) => {
            record.trans_title = std::iter::once(chinese).chain(aka.iter().cloned()).collect();
            record.this_title = vec![foreign];
        }
        None => {
            record.trans_title = aka.clone();
            record.this_title = vec![chinese];
        }
    }
    record.this_title.retain(|t| !t.is_empty());
    record.aka = aka;

    record.year = doc
        .value(TABLE, Field::Year)?
        .and_then(|y| non_empty(y.chars().skip(1).take(4).collect::<String>()));
    record.regions = doc
        .value(TABLE, Field::Regions)?
        .map(|v| split_multi(&v))
        .unwrap_or_default();
    record.genres = doc.values(TABLE, Field::Genres)?;
    record.languages = doc
        .value(TABLE, Field::Languages)?
        .map(|v| split_multi(&v))
        .unwrap_or_default();
    record.release_dates = doc.values(TABLE, Field::ReleaseDates)?;
    sort_release_dates(&mut record.release_dates);
    record.episodes = doc.value(TABLE, Field::Episodes)?;
    record.runtime = match doc.value(TABLE, Field::Runtime)? {
        Some(runtime) => Some(runtime),
        None => doc.texts(RUNTIME_PROPERTY)?.into_iter().next(),
    };
    record.official_site = doc.value(TABLE, Field::OfficialSite)?;

    let synopsis = doc.values(TABLE, Field::Synopsis)?.join("\n");
    record.synopsis = Some(if synopsis.trim().is_empty() {
        NO_SYNOPSIS.to_string()
    } else {
        normalize_lines(&synopsis)
    });
    record.tags = doc.values(TABLE, Field::Tags)?;

    apply_structured_data(&mut record, &ld);

    let imdb_id = doc.value(TABLE, Field::CrossRefId)?;
    if let Some(id) = &imdb_id {
        record.cross_ref = Some(CrossRef {
            site: Site::Imdb,
            id: id.clone(),
            link: Site::Imdb.item_link(id),
        });
    }
    Ok((record, imdb_id))
}

/// Fields taken from the `ld+json` block.
fn apply_structured_data(record: &mut Record, ld: &Value) {
    record.kind = str_at(ld, "@type");
    record.poster = str_at(ld, "image").map(|image| {
        SMALL_POSTER
            .replace_all(&image, "l$1")
            .replacen("img3", "img1", 1)
    });

    let aggregate = ld.get("aggregateRating");
    let score = number(aggregate.and_then(|a| a.get("ratingValue"))).unwrap_or(0.0);
    let votes = count(aggregate.and_then(|a| a.get("ratingCount"))).unwrap_or(0);
    record.push_rating(Site::Douban, score, votes);

    record.push_credit(Role::Director, names_at(ld, "director"));
    record.push_credit(Role::Writer, names_at(ld, "author"));
    record.push_credit(Role::Cast, names_at(ld, "actor"));
}

fn parse_awards(body: &str) -> Result<Option<String>> {
    let doc = Document::parse(body);
    Ok(doc
        .value(TABLE, Field::Awards)?
        .and_then(|html| non_empty(html_block_to_text(&html))))
}

/// `(rating, votes)` from the IMDb JSONP ratings document; `None` when the
/// document is malformed or carries no resource.
fn parse_imdb_rating(body: &str) -> Option<(f64, u64)> {
    let payload = parse_jsonp(body).ok()?;
    let resource = payload.get("resource").filter(|r| r.is_object())?;
    let score = number(resource.get("rating")).unwrap_or(0.0);
    let votes = count(resource.get("ratingCount")).unwrap_or(0);
    Some((score, votes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::StaticFetcher;

    const SUBJECT: &str = include_str!("../../fixtures/douban/subject.html");
    const AWARDS: &str = include_str!("../../fixtures/douban/awards.html");
    const NOT_FOUND_PAGE: &str = include_str!("../../fixtures/douban/not_found.html");

    const LINK: &str = "https://movie.douban.com/subject/27010768/";
    const AWARDS_LINK: &str = "https://movie.douban.com/subject/27010768/awards";

    fn imdb_link() -> String {
        imdb_ratings_url("tt6751668")
    }

    #[test]
    fn classifies_signatures() {
        assert_eq!(classify(NOT_FOUND_PAGE), Some(NOT_FOUND));
        assert_eq!(classify("<p>检测到有异常请求从你的 IP 发出</p>"), Some(BLOCKED));
        assert_eq!(classify(SUBJECT), None);
    }

    #[test]
    fn parses_subject_page() {
        let (record, imdb_id) = parse_subject("27010768", LINK, SUBJECT).unwrap();

        assert_eq!(imdb_id.as_deref(), Some("tt6751668"));
        assert_eq!(record.this_title, vec!["기생충"]);
        assert_eq!(record.trans_title, vec!["寄生虫", "上流寄生族", "寄生上流"]);
        assert_eq!(record.year.as_deref(), Some("2019"));
        assert_eq!(record.regions, vec!["韩国"]);
        assert_eq!(record.genres, vec!["剧情", "喜剧"]);
        assert_eq!(record.languages, vec!["韩语", "英语"]);
        assert_eq!(
            record.release_dates,
            vec!["2019-05-21(戛纳电影节)", "2019-05-30(韩国)", "2019-08-29(中国大陆)"]
        );
        assert_eq!(record.runtime.as_deref(), Some("132分钟"));
        assert_eq!(record.kind.as_deref(), Some("Movie"));
        assert_eq!(
            record.poster.as_deref(),
            Some("https://img1.doubanio.com/view/photo/l_ratio_poster/public/p2561439800.jpg")
        );
        assert_eq!(record.credited(Role::Director), ["奉俊昊 Joon-ho Bong"]);
        assert_eq!(record.credited(Role::Cast).len(), 2);
        assert_eq!(record.tags, vec!["韩国", "黑色幽默"]);
        assert_eq!(record.synopsis.as_deref(), Some("基宇一家四口全是无业游民。\n直到某天……"));

        let douban = record.rating(Site::Douban).unwrap();
        assert_eq!((douban.score, douban.votes), (8.8, 1_900_000));
    }

    #[test]
    fn missing_summary_uses_placeholder() {
        let body = "<html><head><title>某片 (豆瓣)</title></head><body></body></html>";
        let (record, imdb_id) = parse_subject("1", LINK, body).unwrap();

        assert_eq!(imdb_id, None);
        assert_eq!(record.this_title, vec!["某片"]);
        assert!(record.trans_title.is_empty());
        assert_eq!(record.synopsis.as_deref(), Some(NO_SYNOPSIS));
        let douban = record.rating(Site::Douban).unwrap();
        assert_eq!((douban.score, douban.votes), (0.0, 0));
    }

    #[test]
    fn awards_are_flattened() {
        let awards = parse_awards(AWARDS).unwrap().unwrap();
        assert_eq!(
            awards,
            "第92届奥斯卡金像奖 (2020)\n最佳影片 奉俊昊\n最佳导演 奉俊昊\n\n第72届戛纳电影节 (2019)\n主竞赛单元 金棕榈奖 奉俊昊"
        );
    }

    #[test]
    fn imdb_rating_payload() {
        let raw = r#"imdb.rating.run({"resource":{"rating":8.5,"ratingCount":812345}})"#;
        assert_eq!(parse_imdb_rating(raw), Some((8.5, 812_345)));
        assert_eq!(parse_imdb_rating("imdb.rating.run({})"), None);
        assert_eq!(parse_imdb_rating("<html>"), None);
    }

    #[tokio::test]
    async fn extracts_full_record() {
        let fetcher = StaticFetcher::new()
            .page(LINK, SUBJECT)
            .page(AWARDS_LINK, AWARDS)
            .page(
                &imdb_link(),
                r#"imdb.rating.run({"resource":{"rating":8.5,"ratingCount":812345}})"#,
            )
            .shared();
        let douban = Douban::new(fetcher.clone(), None);

        let record = douban.extract("27010768").await.unwrap();

        assert!(record.success);
        assert!(record.awards.as_deref().unwrap().starts_with("第92届奥斯卡金像奖"));
        let imdb = record.rating(Site::Imdb).unwrap();
        assert_eq!((imdb.score, imdb.votes), (8.5, 812_345));
        assert_eq!(record.cross_ref.unwrap().link, "https://www.imdb.com/title/tt6751668/");
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn not_found_issues_no_secondary_requests() {
        let fetcher = StaticFetcher::new().page(LINK, NOT_FOUND_PAGE).shared();
        let douban = Douban::new(fetcher.clone(), None);

        let record = douban.extract("27010768").await.unwrap();

        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some(NOT_FOUND));
        assert_eq!(fetcher.requested(), vec![LINK.to_string()]);
    }

    #[tokio::test]
    async fn failing_rating_lookup_keeps_record() {
        let fetcher = StaticFetcher::new()
            .page(LINK, SUBJECT)
            .page(AWARDS_LINK, AWARDS)
            .fail(&imdb_link())
            .shared();
        let douban = Douban::new(fetcher.clone(), None);

        let record = douban.extract("27010768").await.unwrap();

        assert!(record.success);
        assert!(record.rating(Site::Imdb).is_none());
        assert!(record.rating(Site::Douban).is_some());
        assert!(fetcher.requested().contains(&imdb_link()));
    }

    #[tokio::test]
    async fn cookie_is_sent_with_every_douban_request() {
        let fetcher = StaticFetcher::new()
            .page(LINK, SUBJECT)
            .page(AWARDS_LINK, AWARDS)
            .shared();
        let douban = Douban::new(fetcher.clone(), Some("bid=abc".to_string()));

        douban.extract("27010768").await.unwrap();

        for request in fetcher.requests() {
            if request.url.starts_with("https://movie.douban.com") {
                assert_eq!(request.cookie.as_deref(), Some("bid=abc"));
            } else {
                assert_eq!(request.cookie, None);
            }
        }
    }

    #[tokio::test]
    async fn search_maps_suggestions() {
        let body = r#"[{"episode":"","img":"https://img","title":"寄生虫","url":"https://movie.douban.com/subject/27010768/?suggest=%E5%AF%84","type":"movie","year":"2019","sub_title":"기생충","id":"27010768"}]"#;
        let fetcher = StaticFetcher::new()
            .page(
                "https://movie.douban.com/j/subject_suggest?q=%E5%AF%84%E7%94%9F%E8%99%AB",
                body,
            )
            .shared();
        let douban = Douban::new(fetcher, None);

        let outcome = douban.search("寄生虫").await;

        let results = outcome.results().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].subtype, "movie");
        assert_eq!(results[0].subtitle, "기생충");
        assert_eq!(results[0].link, LINK);
    }

    #[tokio::test]
    async fn search_failure_is_reported_as_data() {
        let fetcher = StaticFetcher::new()
            .fail("https://movie.douban.com/j/subject_suggest?q=x")
            .shared();
        let douban = Douban::new(fetcher, None);

        assert_eq!(douban.search("x").await, SearchOutcome::failed(SEARCH_FAILED));
    }
}
