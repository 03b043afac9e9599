//! Keyword search results.

use serde::{Deserialize, Serialize};

/// One candidate returned by a source's search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub year: String,
    pub subtype: String,
    pub title: String,
    pub subtitle: String,
    pub link: String,
}

/// Outcome of a keyword search.
///
/// A successful outcome always carries `data`, possibly empty; a failed one
/// always carries `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    Found { success: True, data: Vec<SearchResult> },
    Failed { success: False, error: String },
}

impl SearchOutcome {
    /// Results in upstream order.
    pub fn found(data: Vec<SearchResult>) -> Self {
        Self::Found {
            success: True,
            data,
        }
    }

    /// A failure with a fixed, source-specific message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            success: False,
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Results when the search succeeded.
    pub fn results(&self) -> Option<&[SearchResult]> {
        match self {
            Self::Found { data, .. } => Some(data),
            Self::Failed { .. } => None,
        }
    }
}

/// Serializes as the JSON literal `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct True;

/// Serializes as the JSON literal `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct False;

macro_rules! bool_literal {
    ($ty:ident, $value:literal) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bool($value)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if bool::deserialize(deserializer)? == $value {
                    Ok($ty)
                } else {
                    Err(serde::de::Error::custom(concat!("expected ", $value)))
                }
            }
        }
    };
}

bool_literal!(True, true);
bool_literal!(False, false);

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SearchResult {
        SearchResult {
            year: "2019".to_string(),
            subtype: "movie".to_string(),
            title: "寄生虫".to_string(),
            subtitle: "기생충".to_string(),
            link: "https://movie.douban.com/subject/27010768/".to_string(),
        }
    }

    #[test]
    fn found_always_serializes_data() {
        let json = serde_json::to_value(SearchOutcome::found(Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": [] }));
    }

    #[test]
    fn failed_serializes_error_without_data() {
        let json = serde_json::to_value(SearchOutcome::failed("豆瓣搜索失败")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "豆瓣搜索失败" })
        );
    }

    #[test]
    fn success_without_data_is_rejected() {
        let parsed: Result<SearchOutcome, _> =
            serde_json::from_value(serde_json::json!({ "success": true }));
        assert!(parsed.is_err());
    }

    #[test]
    fn round_trips_results() {
        let outcome = SearchOutcome::found(vec![sample()]);
        let json = serde_json::to_string(&outcome).unwrap();
        let back: SearchOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back.results(), Some(&[sample()][..]));
    }
}
