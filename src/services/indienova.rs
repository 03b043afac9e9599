//! Indienova game page extractor.

use async_trait::async_trait;

use super::selectors::Document;
use super::{Extractor, NOT_FOUND, expect_success};
use crate::error::Result;
use crate::models::{Field, Record, Role, SelectorTable, Site, Strategy};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::normalize::{non_empty, normalize_lines};

const NOT_FOUND_SIGNATURE: &str = "出现错误";
const META: &str = "ul.gamedb-meta li > strong";

static TABLE: SelectorTable = &[
    (Field::Title, Strategy::Texts("div.title-holder > h1 > span")),
    (
        Field::OriginalTitle,
        Strategy::Texts("div.title-holder > h1 > small"),
    ),
    (
        Field::Poster,
        Strategy::Attr {
            selector: "div.cover-image img",
            attr: "src",
        },
    ),
    (Field::ReleaseDates, Strategy::Texts("p.gamedb-release")),
    (Field::Platforms, Strategy::Texts("div.gamedb-platforms a")),
    (Field::Tags, Strategy::Texts("div.indienova-tags.gamedb-tags a")),
    (
        Field::Developers,
        Strategy::LabelLinks {
            anchor: META,
            label: "开发商",
        },
    ),
    (
        Field::Publishers,
        Strategy::LabelLinks {
            anchor: META,
            label: "发行商",
        },
    ),
    (
        Field::OfficialSite,
        Strategy::Attr {
            selector: "#tabs-link a.gamedb-link",
            attr: "href",
        },
    ),
    (
        Field::Synopsis,
        Strategy::FirstOf(&["#tabs-intro .entry-content", "article"]),
    ),
    (
        Field::Screenshots,
        Strategy::Attr {
            selector: "ul.gamedb-screenshots img",
            attr: "src",
        },
    ),
];

/// Indienova extractor.
pub struct Indienova {
    fetcher: SharedFetcher,
}

impl Indienova {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for Indienova {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let link = Site::Indienova.item_link(sid);
        let page = self.fetcher.fetch(Request::get(&link)).await?;

        if page.status == 404 || page.body.contains(NOT_FOUND_SIGNATURE) {
            log::info!("indienova {sid}: not found");
            return Ok(Record::failure(Site::Indienova, sid, NOT_FOUND));
        }
        let page = expect_success(page)?;

        let record = parse_game(sid, &link, &page.body)?;
        log::debug!("indienova {sid}: extracted");
        Ok(record.succeed())
    }
}

fn parse_game(sid: &str, link: &str, body: &str) -> Result<Record> {
    let doc = Document::parse(body);
    let mut record = Record::new(Site::Indienova, sid);
    record.link = Some(link.to_string());

    let chinese = doc.value(TABLE, Field::Title)?;
    let english = doc.value(TABLE, Field::OriginalTitle)?;
    match (chinese, english) {
        (Some(chinese), Some(english)) if chinese != english => {
            record.this_title = vec![english];
            record.trans_title = vec![chinese];
        }
        (chinese, english) => record.this_title = chinese.or(english).into_iter().collect(),
    }

    record.poster = doc.value(TABLE, Field::Poster)?;
    record.release_dates = doc.values(TABLE, Field::ReleaseDates)?;
    record.year = record
        .release_dates
        .first()
        .and_then(|d| non_empty(d.chars().take(4).collect::<String>()));
    record.platforms = doc.values(TABLE, Field::Platforms)?;
    record.tags = doc.values(TABLE, Field::Tags)?;
    record.push_credit(Role::Developer, doc.values(TABLE, Field::Developers)?);
    record.push_credit(Role::Publisher, doc.values(TABLE, Field::Publishers)?);
    record.official_site = doc.value(TABLE, Field::OfficialSite)?;
    record.synopsis = doc
        .value(TABLE, Field::Synopsis)?
        .and_then(|s| non_empty(normalize_lines(&s)));
    record.screenshots = doc.values(TABLE, Field::Screenshots)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::StaticFetcher;

    const GAME: &str = include_str!("../../fixtures/indienova/game.html");
    const LINK: &str = "https://indienova.com/game/hollow-knight";

    #[test]
    fn parses_game_page() {
        let record = parse_game("hollow-knight", LINK, GAME).unwrap();

        assert_eq!(record.this_title, vec!["Hollow Knight"]);
        assert_eq!(record.trans_title, vec!["空洞骑士"]);
        assert_eq!(record.release_dates, vec!["2017-02-24"]);
        assert_eq!(record.year.as_deref(), Some("2017"));
        assert_eq!(record.platforms, vec!["Windows", "Switch"]);
        assert_eq!(record.tags, vec!["类银河恶魔城", "动作"]);
        assert_eq!(record.credited(Role::Developer), ["Team Cherry"]);
        assert_eq!(record.credited(Role::Publisher), ["Team Cherry"]);
        assert_eq!(
            record.official_site.as_deref(),
            Some("https://store.steampowered.com/app/367520")
        );
        assert_eq!(record.synopsis.as_deref(), Some("在圣巢之下……\n探索蜿蜒的洞穴。"));
        assert_eq!(record.screenshots.len(), 2);
    }

    #[tokio::test]
    async fn error_page_is_not_found() {
        let fetcher = StaticFetcher::new()
            .page("https://indienova.com/game/nope", "<h1>出现错误</h1>")
            .shared();

        let record = Indienova::new(fetcher).extract("nope").await.unwrap();
        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some(NOT_FOUND));
    }
}
