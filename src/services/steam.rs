//! Steam store page extractor.

use async_trait::async_trait;

use super::selectors::{Document, element_text, parse_selector};
use super::{Extractor, NOT_FOUND, expect_success};
use crate::error::Result;
use crate::models::{Field, Record, Role, SelectorTable, Site, Strategy};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::normalize::{non_empty, normalize_lines};

/// Skips the age gate of mature titles.
const AGE_COOKIE: &str =
    "birthtime=631152001; lastagecheckage=1-January-1990; wants_mature_content=1; mature_content=1";
const DESCRIPTION_HEADING: &str = "关于这款游戏";
const DETAILS: &str = "#genresAndManufacturer b";

static TABLE: SelectorTable = &[
    (Field::Title, Strategy::Texts("div.apphub_AppName")),
    (
        Field::Poster,
        Strategy::Attr {
            selector: "img.game_header_image_full",
            attr: "src",
        },
    ),
    (
        Field::Genres,
        Strategy::LabelLinks {
            anchor: DETAILS,
            label: "类型",
        },
    ),
    (
        Field::Developers,
        Strategy::LabelLinks {
            anchor: DETAILS,
            label: "开发者",
        },
    ),
    (
        Field::Publishers,
        Strategy::LabelLinks {
            anchor: DETAILS,
            label: "发行商",
        },
    ),
    (
        Field::ReleaseDates,
        Strategy::Label {
            anchor: DETAILS,
            label: "发行日期",
        },
    ),
    (Field::Tags, Strategy::Texts("a.app_tag")),
    (
        Field::Languages,
        Strategy::Texts("#languageTable table.game_language_options td.ellipsis"),
    ),
    (
        Field::Platforms,
        Strategy::Attr {
            selector: "div.game_area_purchase_game .platform_img",
            attr: "class",
        },
    ),
    (
        Field::RatingValue,
        Strategy::Attr {
            selector: r#"meta[itemprop="ratingValue"]"#,
            attr: "content",
        },
    ),
    (
        Field::RatingCount,
        Strategy::Attr {
            selector: r#"meta[itemprop="reviewCount"]"#,
            attr: "content",
        },
    ),
    (Field::Synopsis, Strategy::Texts("#game_area_description")),
    (
        Field::Requirements,
        Strategy::FirstOf(&[
            "div.sysreq_content.active .game_area_sys_req_leftCol",
            "div.sysreq_content.active .game_area_sys_req_full",
        ]),
    ),
    (
        Field::Screenshots,
        Strategy::Attr {
            selector: "a.highlight_screenshot_link",
            attr: "href",
        },
    ),
];

const RECOMMENDED_COLUMN: &str = "div.sysreq_content.active .game_area_sys_req_rightCol";

/// Steam extractor.
pub struct Steam {
    fetcher: SharedFetcher,
}

impl Steam {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for Steam {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let link = Site::Steam.item_link(sid);
        let request = Request::get(format!("{link}?l=schinese")).cookie(Some(AGE_COOKIE));
        let page = self.fetcher.fetch(request).await?;

        // Unknown apps redirect to the store front.
        let redirected = !page.url.contains(&format!("/app/{sid}"));
        if page.status == 404 || redirected {
            log::info!("steam {sid}: not found");
            return Ok(Record::failure(Site::Steam, sid, NOT_FOUND));
        }
        let page = expect_success(page)?;

        match parse_app(sid, &link, &page.body)? {
            Some(record) => {
                log::debug!("steam {sid}: extracted");
                Ok(record.succeed())
            }
            None => {
                log::info!("steam {sid}: no app name on page");
                Ok(Record::failure(Site::Steam, sid, NOT_FOUND))
            }
        }
    }
}

/// `platform_img win` → `Windows`.
fn platform_name(class: &str) -> Option<&'static str> {
    class.split_whitespace().find_map(|c| match c {
        "win" => Some("Windows"),
        "mac" => Some("macOS"),
        "linux" => Some("Linux"),
        _ => None,
    })
}

/// `None` when the page carries no app name, i.e. it is not an app page.
fn parse_app(sid: &str, link: &str, body: &str) -> Result<Option<Record>> {
    let doc = Document::parse(body);
    let Some(name) = doc.value(TABLE, Field::Title)? else {
        return Ok(None);
    };

    let mut record = Record::new(Site::Steam, sid);
    record.link = Some(link.to_string());
    record.this_title = vec![name];
    record.poster = doc.value(TABLE, Field::Poster)?;
    record.genres = doc.values(TABLE, Field::Genres)?;
    record.push_credit(Role::Developer, doc.values(TABLE, Field::Developers)?);
    record.push_credit(Role::Publisher, doc.values(TABLE, Field::Publishers)?);
    record.release_dates = doc.values(TABLE, Field::ReleaseDates)?;
    record.year = record
        .release_dates
        .first()
        .and_then(|d| non_empty(d.chars().take(4).collect::<String>()));
    record.tags = doc.values(TABLE, Field::Tags)?;
    record.languages = doc.values(TABLE, Field::Languages)?;

    let mut platforms = Vec::new();
    for class in doc.values(TABLE, Field::Platforms)? {
        if let Some(platform) = platform_name(&class) {
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
    }
    record.platforms = platforms.into_iter().map(str::to_string).collect();

    if let Some(score) = doc
        .value(TABLE, Field::RatingValue)?
        .and_then(|s| s.parse::<f64>().ok())
    {
        let votes = doc
            .value(TABLE, Field::RatingCount)?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        record.push_rating(Site::Steam, score, votes);
    }

    record.synopsis = doc.value(TABLE, Field::Synopsis)?.and_then(|text| {
        let text = normalize_lines(&text);
        non_empty(text.strip_prefix(DESCRIPTION_HEADING).unwrap_or(&text))
    });
    record.requirements = parse_requirements(&doc)?;
    record.screenshots = doc.values(TABLE, Field::Screenshots)?;
    Ok(Some(record))
}

/// Minimum and recommended requirements of the default platform, one line
/// per entry, columns separated by a blank line.
fn parse_requirements(doc: &Document) -> Result<Option<String>> {
    let mut columns: Vec<String> = doc
        .values(TABLE, Field::Requirements)?
        .iter()
        .map(|c| normalize_lines(c))
        .collect();

    let right = parse_selector(RECOMMENDED_COLUMN)?;
    columns.extend(
        doc.html()
            .select(&right)
            .map(|el| normalize_lines(&element_text(&el)))
            .filter(|c| !c.is_empty()),
    );
    Ok(non_empty(columns.join("\n\n")))
}
