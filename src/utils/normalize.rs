// src/utils/normalize.rs

//! Field-level normalization rules shared by every extractor.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Delimiter of multi-valued label fields.
pub const MULTI_VALUE_DELIMITER: &str = " / ";

static TAG_PADDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(<[^>]+>)\s*").expect("valid regex"));
static BLOCK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:div|ul)[^>]*>").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static SPACE_BEFORE_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +\n").expect("valid regex"));
static LEADING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4})(?:[-/.年](\d{1,2}))?(?:[-/.月](\d{1,2}))?").expect("valid regex")
});

/// Trimmed value, or `None` when only whitespace remains.
pub fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Split a `" / "`-delimited label value into trimmed, non-empty parts.
pub fn split_multi(value: &str) -> Vec<String> {
    value
        .split(MULTI_VALUE_DELIMITER)
        .filter_map(non_empty)
        .collect()
}

/// Trim every line, drop the empty ones and rejoin with newlines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix every continuation line of `text` with `pad`.
pub fn indent_continuation(text: &str, pad: &str) -> String {
    text.replace('\n', &format!("\n{pad}"))
}

/// Flatten an HTML fragment into text, one block per line.
///
/// Whitespace around tags is dropped, adjacent list items and trailing spans
/// get a separating space, `div`/`ul` openings become newlines, every other
/// tag is removed and spaces before a newline are collapsed.
pub fn html_block_to_text(html: &str) -> String {
    let text = TAG_PADDING.replace_all(html, "$1");
    let text = text
        .replace("</li><li>", "</li> <li>")
        .replace("</a><span", "</a> <span");
    let text = BLOCK_OPEN.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = SPACE_BEFORE_NEWLINE.replace_all(&text, "\n");
    text.trim().to_string()
}

/// Decode the handful of entities the HTML serializer emits.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Compare two strings the way a locale-aware collator would. Characters are
/// grouped as whitespace, then punctuation and symbols, then digits, then
/// letters. Within a group they compare without accents and case first, then
/// with accents, then raw.
///
/// Letters of different scripts compare by code point rather than by a
/// CLDR script order.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let (a_base, a_accented) = collation_keys(a);
    let (b_base, b_accented) = collation_keys(b);

    a_base
        .cmp(&b_base)
        .then_with(|| a_accented.cmp(&b_accented))
        .then_with(|| a.cmp(b))
}

type CollationKey = Vec<(u8, char)>;

fn collation_keys(value: &str) -> (CollationKey, CollationKey) {
    let accented: Vec<char> = value.nfd().flat_map(char::to_lowercase).collect();
    let base = accented
        .iter()
        .filter(|c| !is_combining_mark(**c))
        .map(|&c| (char_group(c), c))
        .collect();
    let accented = accented.into_iter().map(|c| (char_group(c), c)).collect();
    (base, accented)
}

fn char_group(c: char) -> u8 {
    if c.is_whitespace() {
        0
    } else if c.is_numeric() {
        2
    } else if c.is_alphabetic() || is_combining_mark(c) {
        3
    } else {
        1
    }
}

/// Stable, locale-aware ascending sort.
pub fn sort_locale(values: &mut [String]) {
    values.sort_by(|a, b| locale_cmp(a, b));
}

/// Calendar date at the start of `value` (`2019-05-30(中国大陆)` → 2019-05-30).
/// Missing month or day count as the first one.
pub fn leading_date(value: &str) -> Option<NaiveDate> {
    let caps = LEADING_DATE.captures(value)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, part(2).unwrap_or(1), part(3).unwrap_or(1))
}

/// Sort release dates ascending by calendar date. Entries without a date keep
/// their relative order after the dated ones.
pub fn sort_release_dates(values: &mut [String]) {
    values.sort_by_key(|value| {
        let date = leading_date(value);
        (date.is_none(), date)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn alternate_names_follow_collation_not_bytes() {
        let mut names = strings(&["Zeta", "Beta", "älpha"]);
        sort_locale(&mut names);
        assert_eq!(names, strings(&["älpha", "Beta", "Zeta"]));

        let mut bytes = strings(&["Zeta", "Beta", "älpha"]);
        bytes.sort();
        assert_ne!(names, bytes);
    }

    #[test]
    fn punctuation_and_digits_sort_before_letters() {
        let mut names = strings(&["Parasite", "Zeta", "~tilde", "2046", "Ñandú", "(untitled)"]);
        sort_locale(&mut names);
        assert_eq!(
            names,
            strings(&["(untitled)", "~tilde", "2046", "Ñandú", "Parasite", "Zeta"])
        );
    }

    #[test]
    fn collation_is_case_insensitive_first() {
        let mut names = strings(&["beta", "Alpha", "alpha2"]);
        sort_locale(&mut names);
        assert_eq!(names, strings(&["Alpha", "alpha2", "beta"]));
    }

    #[test]
    fn release_dates_sort_chronologically() {
        let mut dates = strings(&["2020-05-01", "2019-12-25", "2020-01-10"]);
        sort_release_dates(&mut dates);
        assert_eq!(dates, strings(&["2019-12-25", "2020-01-10", "2020-05-01"]));
    }

    #[test]
    fn release_dates_with_region_suffix() {
        let mut dates = strings(&["2019-05-30(韩国)", "2019-05-21(戛纳电影节)", "未知", "2019(美国)"]);
        sort_release_dates(&mut dates);
        assert_eq!(
            dates,
            strings(&["2019(美国)", "2019-05-21(戛纳电影节)", "2019-05-30(韩国)", "未知"])
        );
    }

    #[test]
    fn leading_date_variants() {
        assert_eq!(leading_date("2019-5-3"), NaiveDate::from_ymd_opt(2019, 5, 3));
        assert_eq!(leading_date("2021年7月"), NaiveDate::from_ymd_opt(2021, 7, 1));
        assert_eq!(leading_date("TBA"), None);
    }

    #[test]
    fn split_multi_drops_blanks() {
        assert_eq!(split_multi(" 英语 / 法语 /  "), strings(&["英语", "法语"]));
        assert!(split_multi("   ").is_empty());
    }

    #[test]
    fn normalize_lines_trims_and_drops_empty() {
        let text = "\n   第一行  \n\n    第二行\n  \n";
        assert_eq!(normalize_lines(text), "第一行\n第二行");
    }

    #[test]
    fn indent_continuation_pads_following_lines() {
        assert_eq!(indent_continuation("a\nb\nc", "　　"), "a\n　　b\n　　c");
    }

    #[test]
    fn awards_block_flattens_to_lines() {
        let html = r#"
            <div class="awards">
                <div class="hd">
                    <h2>
                        <a href="https://movie.douban.com/awards/Oscar/92/">第92届奥斯卡金像奖</a>
                        <span class="year">(2020)</span>
                    </h2>
                </div>
                <ul class="award">
                    <li>最佳影片</li>
                    <li><a href="/celebrity/1/">奉俊昊</a></li>
                </ul>
                <ul class="award">
                    <li>最佳原创剧本</li>
                    <li><a href="/celebrity/2/">韩珍元&nbsp;&amp;</a></li>
                </ul>
            </div>"#;

        assert_eq!(
            html_block_to_text(html),
            "第92届奥斯卡金像奖 (2020)\n最佳影片 奉俊昊\n最佳原创剧本 韩珍元 &"
        );
    }

    #[test]
    fn non_empty_trims() {
        assert_eq!(non_empty("  x "), Some("x".to_string()));
        assert_eq!(non_empty(" \n"), None);
    }
}
