//! Renders records into tracker description text.
//!
//! This is the only place user-facing text is produced. Every template follows
//! the same rule: a line is written only when its field has a value, except
//! for the rating lines a template declares as always present.

mod bangumi;
mod game;
mod imdb;
mod movie;

use std::fmt::Display;

use crate::models::{Record, Site};

/// Render `record` with the template of its site.
pub fn format(record: &Record) -> String {
    match record.site {
        Site::Douban => movie::render(record),
        Site::Imdb => imdb::render(record),
        Site::Bangumi => bangumi::render(record),
        Site::Steam | Site::Indienova | Site::Epic => game::render(record),
    }
}

/// `{score}/10 from {votes} users`, with absent ratings shown as zero.
pub(crate) fn score_line(score: Option<f64>, votes: Option<u64>) -> String {
    format!("{}/10 from {} users", score.unwrap_or(0.0), votes.unwrap_or(0))
}

/// Incremental writer for one description.
pub(crate) struct Description {
    out: String,
}

impl Description {
    pub fn new() -> Self {
        Self { out: String::new() }
    }

    /// Poster wrapped in an image tag, followed by a blank line.
    pub fn image(&mut self, url: Option<&str>) -> &mut Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.out.push_str(&format!("[img]{url}[/img]\n\n"));
        }
        self
    }

    /// `label` + `value`, skipped when the value is empty.
    pub fn line(&mut self, label: &str, value: impl AsRef<str>) -> &mut Self {
        let value = value.as_ref();
        if !value.is_empty() {
            self.out.push_str(label);
            self.out.push_str(value);
            self.out.push('\n');
        }
        self
    }

    /// `label` + `value`, always written.
    pub fn always(&mut self, label: &str, value: impl Display) -> &mut Self {
        self.out.push_str(&format!("{label}{value}\n"));
        self
    }

    /// Text appended verbatim.
    pub fn raw(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_line_defaults_to_zero() {
        assert_eq!(score_line(None, None), "0/10 from 0 users");
        assert_eq!(score_line(Some(8.5), Some(1024)), "8.5/10 from 1024 users");
        assert_eq!(score_line(Some(9.0), Some(3)), "9/10 from 3 users");
    }

    #[test]
    fn empty_values_produce_no_line() {
        let mut d = Description::new();
        d.line("A: ", "").line("B: ", "x").image(None);
        assert_eq!(d.finish(), "B: x\n");
    }

    #[test]
    fn formatting_is_deterministic() {
        for site in Site::ALL {
            let mut record = Record::new(site, "1").succeed();
            record.this_title = vec!["Title".to_string()];
            record.synopsis = Some("line one\nline two".to_string());
            assert_eq!(format(&record), format(&record));
        }
    }
}
