//! Applies selector tables to parsed pages.
//!
//! [`Document`] wraps a parsed page and evaluates one [`Strategy`] at a time,
//! so every rule of a site's table can be checked against a fixture alone.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Field, SelectorTable, Strategy, rule_for};
use crate::utils::normalize::non_empty;

/// Parse a CSS selector, reporting the offending selector on failure.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Text content of an element, with surrounding whitespace trimmed.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// A parsed page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All values the table's rule for `field` yields; empty when the table
    /// has no rule for it.
    pub fn values(&self, table: SelectorTable, field: Field) -> Result<Vec<String>> {
        match rule_for(table, field) {
            Some(strategy) => self.apply(strategy),
            None => Ok(Vec::new()),
        }
    }

    /// First value the table's rule for `field` yields.
    pub fn value(&self, table: SelectorTable, field: Field) -> Result<Option<String>> {
        Ok(self.values(table, field)?.into_iter().next())
    }

    /// Evaluate one strategy.
    pub fn apply(&self, strategy: Strategy) -> Result<Vec<String>> {
        match strategy {
            Strategy::Texts(selector) => self.texts(selector),
            Strategy::FirstOf(selectors) => {
                for selector in selectors {
                    let texts = self.texts(selector)?;
                    if !texts.is_empty() {
                        return Ok(texts);
                    }
                }
                Ok(Vec::new())
            }
            Strategy::Label { anchor, label } => {
                Ok(self.label_text(anchor, label)?.into_iter().collect())
            }
            Strategy::LabelLinks { anchor, label } => self.label_links(anchor, label),
            Strategy::Attr { selector, attr } => {
                let sel = parse_selector(selector)?;
                Ok(self
                    .html
                    .select(&sel)
                    .filter_map(|el| el.value().attr(attr))
                    .filter_map(non_empty)
                    .collect())
            }
            Strategy::InnerHtml(selector) => {
                let sel = parse_selector(selector)?;
                Ok(self
                    .html
                    .select(&sel)
                    .next()
                    .map(|el| el.inner_html())
                    .into_iter()
                    .collect())
            }
        }
    }

    /// Trimmed, non-empty text of every element matching `selector`.
    pub fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let sel = parse_selector(selector)?;
        Ok(self
            .html
            .select(&sel)
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty())
            .collect())
    }

    /// Label elements matching `anchor` whose text contains `label`.
    fn anchors<'a>(
        &'a self,
        anchor: &str,
        label: &'a str,
    ) -> Result<impl Iterator<Item = ElementRef<'a>> + 'a> {
        let sel = parse_selector(anchor)?;
        let matches: Vec<ElementRef<'a>> = self
            .html
            .select(&sel)
            .filter(|el| el.text().collect::<String>().contains(label))
            .collect();
        Ok(matches.into_iter())
    }

    /// Text node right after the first matching label.
    fn label_text(&self, anchor: &str, label: &str) -> Result<Option<String>> {
        Ok(self.anchors(anchor, label)?.find_map(|el| {
            el.next_sibling()
                .and_then(|node| node.value().as_text().and_then(|t| non_empty(&**t)))
        }))
    }

    /// Link texts between the first matching label and the next label or
    /// line break.
    fn label_links(&self, anchor: &str, label: &str) -> Result<Vec<String>> {
        let link = parse_selector("a")?;
        let Some(start) = self.anchors(anchor, label)?.next() else {
            return Ok(Vec::new());
        };
        let label_tag = start.value().name().to_string();

        let mut values = Vec::new();
        for node in start.next_siblings() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let name = element.value().name();
            if name == "br" || name == label_tag {
                break;
            }
            if name == "a" {
                values.extend(non_empty(element_text(&element)));
            } else {
                values.extend(element.select(&link).filter_map(|a| non_empty(element_text(&a))));
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SAMPLE_TABLE;

    const PAGE: &str = r#"
        <html><body>
        <h1> Heading </h1>
        <div id="info">
            <span class="pl">语言:</span> 英语 / 法语<br/>
            <span class="pl">官方网站:</span> <a href="http://example.com">example.com</a><br/>
        </div>
        <div class="block">
            <b>类型:</b> <span><a href="/g/1">动作</a>, <a href="/g/2">冒险</a></span><br>
            <b>开发者:</b> <a href="/d/1">Studio</a>
        </div>
        <p class="summary">  short </p>
        </body></html>"#;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("div.class").is_ok());
        assert!(parse_selector("tr:has(a)").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }

    #[test]
    fn table_rules_resolve_through_document() {
        let doc = Document::parse(PAGE);
        assert_eq!(
            doc.value(SAMPLE_TABLE, Field::Title).unwrap(),
            Some("Heading".to_string())
        );
        assert_eq!(
            doc.value(SAMPLE_TABLE, Field::Languages).unwrap(),
            Some("英语 / 法语".to_string())
        );
        assert!(doc.values(SAMPLE_TABLE, Field::Tags).unwrap().is_empty());
    }

    #[test]
    fn label_without_text_sibling_is_none() {
        let doc = Document::parse(PAGE);
        let values = doc
            .apply(Strategy::Label {
                anchor: "#info span.pl",
                label: "官方网站",
            })
            .unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn label_links_stop_at_line_break() {
        let doc = Document::parse(PAGE);
        let genres = doc
            .apply(Strategy::LabelLinks {
                anchor: ".block b",
                label: "类型",
            })
            .unwrap();
        assert_eq!(genres, vec!["动作", "冒险"]);

        let developers = doc
            .apply(Strategy::LabelLinks {
                anchor: ".block b",
                label: "开发者",
            })
            .unwrap();
        assert_eq!(developers, vec!["Studio"]);
    }

    #[test]
    fn first_of_falls_through_empty_selectors() {
        let doc = Document::parse(PAGE);
        let values = doc
            .apply(Strategy::FirstOf(&["span.hidden", "p.summary"]))
            .unwrap();
        assert_eq!(values, vec!["short"]);
    }

    #[test]
    fn attr_and_inner_html() {
        let doc = Document::parse(PAGE);
        assert_eq!(
            doc.apply(Strategy::Attr {
                selector: "#info > a",
                attr: "href"
            })
            .unwrap(),
            vec!["http://example.com"]
        );
        assert_eq!(
            doc.apply(Strategy::InnerHtml("p.summary")).unwrap(),
            vec!["  short "]
        );
    }
}
