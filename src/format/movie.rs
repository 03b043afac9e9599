//! Full-width labelled block used for movie and TV records.

use super::{Description, score_line};
use crate::models::{Record, Role, Site};
use crate::utils::normalize::indent_continuation;

/// Continuation indent of the cast list.
const CAST_PAD: &str = "　　　　  　";
/// Continuation indent of synopsis and awards.
const TEXT_PAD: &str = "　　";

pub(super) fn render(record: &Record) -> String {
    let imdb = record.rating(Site::Imdb);
    let douban = record.rating(record.site);
    let imdb_link = record
        .cross_ref
        .as_ref()
        .filter(|x| x.site == Site::Imdb)
        .map(|x| x.link.as_str())
        .unwrap_or_default();

    let mut d = Description::new();
    d.image(record.poster.as_deref())
        .line("◎译　　名　", record.trans_title.join("/"))
        .line("◎片　　名　", record.this_title.join("/"))
        .line("◎年　　代　", record.year.as_deref().unwrap_or_default())
        .line("◎产　　地　", record.regions.join(" / "))
        .line("◎类　　别　", record.genres.join(" / "))
        .line("◎语　　言　", record.languages.join(" / "))
        .line("◎上映日期　", record.release_dates.join(" / "))
        .line("◎官方网站　", record.official_site.as_deref().unwrap_or_default())
        .always(
            "◎IMDb评分  ",
            score_line(imdb.map(|r| r.score), imdb.map(|r| r.votes)),
        )
        .line("◎IMDb链接  ", imdb_link)
        .always(
            "◎豆瓣评分　",
            score_line(douban.map(|r| r.score), douban.map(|r| r.votes)),
        )
        .line("◎豆瓣链接　", record.link.as_deref().unwrap_or_default())
        .line("◎集　　数　", record.episodes.as_deref().unwrap_or_default())
        .line("◎片　　长　", record.runtime.as_deref().unwrap_or_default())
        .line("◎导　　演　", record.credited(Role::Director).join(" / "))
        .line("◎编　　剧　", record.credited(Role::Writer).join(" / "))
        .line(
            "◎主　　演　",
            record.credited(Role::Cast).join(&format!("\n{CAST_PAD}")),
        );

    if !record.tags.is_empty() {
        d.raw("\n").line("◎标　　签　", record.tags.join(" | "));
    }
    if let Some(synopsis) = record.synopsis.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!(
            "\n◎简　　介\n\n{TEXT_PAD}{}\n",
            indent_continuation(synopsis, TEXT_PAD)
        ));
    }
    if let Some(awards) = record.awards.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!(
            "\n◎获奖情况\n\n{TEXT_PAD}{}\n",
            indent_continuation(awards, TEXT_PAD)
        ));
    }

    d.finish()
}
