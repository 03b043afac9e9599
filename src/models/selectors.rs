// src/models/selectors.rs

//! Named extraction rules for scraping an item page.
//!
//! Each site declares one table mapping a field to the way it is found in the
//! markup. A markup change on the upstream is fixed by editing one entry.

/// Field a rule extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    /// Item type as the page names it
    Kind,
    OriginalTitle,
    Aka,
    Year,
    Regions,
    Genres,
    Languages,
    ReleaseDates,
    Episodes,
    Runtime,
    OfficialSite,
    CrossRefId,
    Poster,
    Synopsis,
    Tags,
    Awards,
    Developers,
    Publishers,
    Platforms,
    RatingValue,
    RatingCount,
    Requirements,
    Screenshots,
    Infobox,
    /// Embedded `application/ld+json` document
    StructuredData,
}

/// How a field is located in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Trimmed text of every element matching the selector.
    Texts(&'static str),

    /// Text of the matches of the first selector that matches anything.
    FirstOf(&'static [&'static str]),

    /// Text node that follows a label element whose text contains `label`.
    Label {
        anchor: &'static str,
        label: &'static str,
    },

    /// Text of the elements following a label element, up to the next label.
    LabelLinks {
        anchor: &'static str,
        label: &'static str,
    },

    /// Attribute of every element matching the selector.
    Attr {
        selector: &'static str,
        attr: &'static str,
    },

    /// Inner HTML of the first element matching the selector.
    InnerHtml(&'static str),
}

/// A site's rule table.
pub type SelectorTable = &'static [(Field, Strategy)];

/// Look up the rule for `field` in a table.
pub fn rule_for(table: SelectorTable, field: Field) -> Option<Strategy> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, strategy)| *strategy)
}

/// Rules used by the generic tests below.
#[cfg(test)]
pub(crate) const SAMPLE_TABLE: SelectorTable = &[
    (Field::Title, Strategy::Texts("h1")),
    (
        Field::Languages,
        Strategy::Label {
            anchor: "#info span.pl",
            label: "语言",
        },
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_declared_rule() {
        assert_eq!(
            rule_for(SAMPLE_TABLE, Field::Title),
            Some(Strategy::Texts("h1"))
        );
    }

    #[test]
    fn missing_rule_is_none() {
        assert_eq!(rule_for(SAMPLE_TABLE, Field::Awards), None);
    }
}
