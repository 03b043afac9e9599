//! Bangumi subject extractor and API search.

use async_trait::async_trait;
use scraper::ElementRef;
use serde::Deserialize;

use super::selectors::{Document, element_text, parse_selector};
use super::{Extractor, NOT_FOUND, Searcher, expect_success, spawn_fetch};
use crate::error::Result;
use crate::models::{
    Field, Record, Role, SearchOutcome, SearchResult, SelectorTable, Site, Strategy,
};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::normalize::{non_empty, normalize_lines, sort_locale, sort_release_dates};
use crate::utils::{resolve, with_path_segment};

pub const SEARCH_FAILED: &str = "Bangumi搜索失败";

const NOT_FOUND_SIGNATURE: &str = "呜咕，出错了";
const SEARCH_BASE: &str = "https://api.bgm.tv/search/subject";

/// Infobox keys that describe the subject rather than its staff.
const NON_STAFF_KEYS: &[&str] = &[
    "中文名",
    "话数",
    "放送开始",
    "放送星期",
    "别名",
    "官方网站",
    "播放电视台",
    "其他电视台",
    "Copyright",
];
const STAFF_LIMIT: usize = 15;
const CAST_LIMIT: usize = 9;

static TABLE: SelectorTable = &[
    (Field::OriginalTitle, Strategy::Texts("h1.nameSingle > a")),
    (Field::Kind, Strategy::Texts("h1.nameSingle > small")),
    (
        Field::Poster,
        Strategy::Attr {
            selector: "#bangumiInfo a.thickbox.cover",
            attr: "href",
        },
    ),
    (Field::Infobox, Strategy::Texts("#infobox > li")),
    (Field::Synopsis, Strategy::Texts("#subject_summary")),
    (Field::Tags, Strategy::Texts(".subject_tag_section a.l > span")),
    (Field::RatingValue, Strategy::Texts(".global_score span.number")),
    (
        Field::RatingCount,
        Strategy::Texts(r#"span[property="v:votes"]"#),
    ),
];

const CAST_BLOCK: &str = "#columnInSubjectA > div.clearit";
const CAST_NAME: &str = "h2 > a.l";
const CAST_ACTORS: &str = ".actorBadge a.l";

/// Bangumi extractor and searcher.
pub struct Bangumi {
    fetcher: SharedFetcher,
}

impl Bangumi {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }

    async fn query(&self, query: &str) -> Result<Vec<SearchResult>> {
        let mut url = url::Url::parse(&with_path_segment(SEARCH_BASE, query)?)?;
        url.query_pairs_mut().append_pair("responseGroup", "large");

        let page = expect_success(self.fetcher.fetch(Request::get(url.as_str())).await?)?;
        let payload: SearchPayload = page.json()?;
        Ok(payload.list.into_iter().map(SearchItem::into_result).collect())
    }
}

#[async_trait]
impl Extractor for Bangumi {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let link = Site::Bangumi.item_link(sid);
        let page = self.fetcher.fetch(Request::get(&link)).await?;

        if page.body.contains(NOT_FOUND_SIGNATURE) {
            log::info!("bangumi {sid}: not found");
            return Ok(Record::failure(Site::Bangumi, sid, NOT_FOUND));
        }
        let page = expect_success(page)?;

        let characters = spawn_fetch(&self.fetcher, Request::get(format!("{link}/characters")));
        let mut record = parse_subject(sid, &link, &page.body)?;

        let characters = characters.await??;
        if characters.is_success() {
            record.push_credit(Role::Cast, parse_cast(&characters.body)?);
        } else {
            log::debug!("bangumi {sid}: characters page answered {}", characters.status);
        }

        log::debug!("bangumi {sid}: extracted");
        Ok(record.succeed())
    }
}

#[async_trait]
impl Searcher for Bangumi {
    async fn search(&self, query: &str) -> SearchOutcome {
        match self.query(query).await {
            Ok(results) => SearchOutcome::found(results),
            Err(e) => {
                log::warn!("bangumi search {query:?} failed: {e}");
                SearchOutcome::failed(SEARCH_FAILED)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    list: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    #[serde(default, rename = "type")]
    kind: u8,
    #[serde(default)]
    name: String,
    #[serde(default)]
    name_cn: String,
    #[serde(default)]
    air_date: String,
}

impl SearchItem {
    fn into_result(self) -> SearchResult {
        let title = if self.name_cn.is_empty() {
            self.name.clone()
        } else {
            self.name_cn
        };
        SearchResult {
            year: self.air_date.chars().take(4).collect(),
            subtype: subtype_name(self.kind).to_string(),
            title,
            subtitle: self.name,
            link: Site::Bangumi.item_link(&self.id.to_string()),
        }
    }
}

fn subtype_name(kind: u8) -> &'static str {
    match kind {
        1 => "漫画/小说",
        2 => "动画/二次元番",
        3 => "音乐",
        4 => "游戏",
        6 => "三次元番",
        _ => "",
    }
}

fn parse_subject(sid: &str, link: &str, body: &str) -> Result<Record> {
    let doc = Document::parse(body);
    let mut record = Record::new(Site::Bangumi, sid);
    record.link = Some(link.to_string());

    record.this_title = doc.value(TABLE, Field::OriginalTitle)?.into_iter().collect();
    record.kind = doc.value(TABLE, Field::Kind)?;
    record.poster = doc
        .value(TABLE, Field::Poster)?
        .and_then(|href| resolve(link, &href));
    record.synopsis = doc
        .value(TABLE, Field::Synopsis)?
        .map(|s| normalize_lines(&s))
        .filter(|s| !s.is_empty());
    record.tags = doc.values(TABLE, Field::Tags)?;

    if let Some(score) = doc
        .value(TABLE, Field::RatingValue)?
        .and_then(|s| s.parse::<f64>().ok())
    {
        let votes = doc
            .value(TABLE, Field::RatingCount)?
            .and_then(|v| v.replace(',', "").parse().ok())
            .unwrap_or(0);
        record.push_rating(Site::Bangumi, score, votes);
    }

    let mut staff = 0;
    for entry in doc.values(TABLE, Field::Infobox)? {
        let Some((key, value)) = entry.split_once(':') else {
            continue;
        };
        let (key, Some(value)) = (key.trim(), non_empty(value)) else {
            continue;
        };
        match key {
            "中文名" => record.trans_title.push(value),
            "别名" => record.aka.push(value),
            "话数" => record.episodes = Some(value),
            "放送开始" | "发售日" | "上映年度" => record.release_dates.push(value),
            "官方网站" => record.official_site = Some(value),
            _ if NON_STAFF_KEYS.contains(&key) => {}
            _ if staff < STAFF_LIMIT => {
                staff += 1;
                record.push_staff(key, vec![value]);
            }
            _ => {}
        }
    }
    sort_locale(&mut record.aka);
    sort_release_dates(&mut record.release_dates);
    record.year = record
        .release_dates
        .first()
        .and_then(|d| non_empty(d.chars().take(4).collect::<String>()));
    Ok(record)
}

/// `角色: 声优` lines from the characters page.
fn parse_cast(body: &str) -> Result<Vec<String>> {
    let doc = Document::parse(body);
    let block = parse_selector(CAST_BLOCK)?;
    let name = parse_selector(CAST_NAME)?;
    let actors = parse_selector(CAST_ACTORS)?;

    let line = |el: ElementRef<'_>| {
        let character = el.select(&name).next().map(|n| element_text(&n))?;
        let cv: Vec<String> = el.select(&actors).map(|a| element_text(&a)).collect();
        Some(if cv.is_empty() {
            character
        } else {
            format!("{character}: {}", cv.join("、"))
        })
    };
    Ok(doc
        .html()
        .select(&block)
        .filter_map(line)
        .take(CAST_LIMIT)
        .collect())
}
