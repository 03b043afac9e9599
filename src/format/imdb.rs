//! English block for IMDb records.

use super::{Description, score_line};
use crate::models::{Record, Role, Site};
use crate::utils::normalize::indent_continuation;

const LABEL_WIDTH: usize = 17;
const TEXT_PAD: &str = "    ";

fn label(name: &str) -> String {
    format!("{:<LABEL_WIDTH$}", format!("{name}:"))
}

pub(super) fn render(record: &Record) -> String {
    let rating = record.rating(Site::Imdb);
    let pad = " ".repeat(LABEL_WIDTH);

    let mut d = Description::new();
    d.image(record.poster.as_deref())
        .line(&label("Title"), record.this_title.join(" / "))
        .line(&label("Also Known As"), record.aka.join(" / "))
        .line(&label("Type"), record.kind.as_deref().unwrap_or_default())
        .line(&label("Genres"), record.genres.join(" / "))
        .line(&label("Date Published"), record.release_dates.join(" / "))
        .line(&label("Runtime"), record.runtime.as_deref().unwrap_or_default())
        .line(&label("Countries"), record.regions.join(" / "))
        .line(&label("Languages"), record.languages.join(" / "))
        .line(
            &label("Content Rating"),
            record.content_rating.as_deref().unwrap_or_default(),
        )
        .always(
            &label("IMDb Rating"),
            score_line(rating.map(|r| r.score), rating.map(|r| r.votes)),
        )
        .line(&label("IMDb Link"), record.link.as_deref().unwrap_or_default())
        .line(
            &label("Official Site"),
            record.official_site.as_deref().unwrap_or_default(),
        )
        .line(&label("Directors"), record.credited(Role::Director).join(" / "))
        .line(&label("Creators"), record.credited(Role::Creator).join(" / "))
        .line(
            &label("Actors"),
            record.credited(Role::Cast).join(&format!("\n{pad}")),
        )
        .line(&label("Keywords"), record.tags.join(", "));

    if let Some(synopsis) = record.synopsis.as_deref().filter(|s| !s.is_empty()) {
        d.raw(&format!(
            "\nIntroduction\n{TEXT_PAD}{}\n",
            indent_continuation(synopsis, TEXT_PAD)
        ));
    }
    d.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_aligned() {
        assert_eq!(label("Title"), "Title:           ");
        assert_eq!(label("Date Published").chars().count(), LABEL_WIDTH);
    }

    #[test]
    fn renders_populated_lines_only() {
        let mut record = Record::new(Site::Imdb, "tt0111161");
        record.link = Some("https://www.imdb.com/title/tt0111161/".to_string());
        record.this_title = vec!["The Shawshank Redemption".to_string()];
        record.kind = Some("Movie".to_string());
        record.runtime = Some("2h 22m".to_string());
        record.push_rating(Site::Imdb, 9.3, 2_800_000);
        record.push_credit(Role::Cast, vec!["Tim Robbins".to_string(), "Morgan Freeman".to_string()]);
        record.synopsis = Some("Two imprisoned men bond.".to_string());

        let expected = "Title:           The Shawshank Redemption\n\
Type:            Movie\n\
Runtime:         2h 22m\n\
IMDb Rating:     9.3/10 from 2800000 users\n\
IMDb Link:       https://www.imdb.com/title/tt0111161/\n\
Actors:          Tim Robbins\n                 Morgan Freeman\n\
\n\
Introduction\n    Two imprisoned men bond.\n";

        assert_eq!(render(&record.succeed()), expected);
    }

    #[test]
    fn rating_line_defaults_when_missing() {
        let text = render(&Record::new(Site::Imdb, "tt1").succeed());
        assert_eq!(text, "IMDb Rating:     0/10 from 0 users\n");
    }
}
