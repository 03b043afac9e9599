// src/utils/json.rs

//! Helpers for embedded structured data and script-wrapped JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};

static JSONP_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^[^(]*\(\s*(.*?)\s*\)\s*;?\s*$").expect("valid regex"));

/// Unwrap a `callback({...})` response into its JSON payload. Plain JSON is
/// accepted as well.
pub fn parse_jsonp(raw: &str) -> Result<Value> {
    let raw = raw.trim();
    if raw.starts_with('{') || raw.starts_with('[') {
        return Ok(serde_json::from_str(raw)?);
    }
    let caps = JSONP_WRAPPER
        .captures(raw)
        .ok_or_else(|| AppError::parse("jsonp", "no callback wrapper found"))?;
    Ok(serde_json::from_str(&caps[1])?)
}

/// Parse an `application/ld+json` block. Raw control characters inside the
/// block are dropped first; a missing block parses as an empty object.
pub fn parse_ld_json(raw: Option<&str>) -> Result<Value> {
    match raw {
        Some(raw) => {
            let cleaned: String = raw
                .chars()
                .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
                .collect();
            if cleaned.trim().is_empty() {
                Ok(Value::Object(Default::default()))
            } else {
                Ok(serde_json::from_str(&cleaned)?)
            }
        }
        None => Ok(Value::Object(Default::default())),
    }
}

/// Trimmed, non-empty string at `key`.
pub fn str_at(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Number that may be encoded as a JSON number or a numeric string.
pub fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative count that may be encoded as a number or a string with
/// thousands separators.
pub fn count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

/// Strings at `key`, whether stored as one string or an array of strings.
pub fn strings_at(value: &Value, key: &str) -> Vec<String> {
    match value.get(key) {
        Some(Value::String(s)) => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// `name` of every person/organization at `key` (single object or array).
pub fn names_at(value: &Value, key: &str) -> Vec<String> {
    let named = |item: &Value| str_at(item, "name");
    match value.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(named).collect(),
        Some(item @ Value::Object(_)) => named(item).into_iter().collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_jsonp_callback() {
        let raw = r#"imdb.rating.run({"resource":{"rating":8.5,"ratingCount":812345}})"#;
        let value = parse_jsonp(raw).unwrap();
        assert_eq!(value["resource"]["rating"], json!(8.5));
    }

    #[test]
    fn unwraps_callback_with_semicolon_and_newlines() {
        let raw = "imdb$dune(\n{\"d\":[{\"l\":\"Dune\"}]}\n);\n";
        let value = parse_jsonp(raw).unwrap();
        assert_eq!(value["d"][0]["l"], json!("Dune"));
    }

    #[test]
    fn accepts_plain_json() {
        assert_eq!(parse_jsonp(r#"{"a":1}"#).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_jsonp("<html>").is_err());
    }

    #[test]
    fn ld_json_strips_control_characters() {
        let raw = "{\n\t\"name\": \"寄生虫\",\r\n\"description\": \"a\nb\"}";
        let value = parse_ld_json(Some(raw)).unwrap();
        assert_eq!(value["description"], json!("ab"));
    }

    #[test]
    fn missing_ld_json_is_empty_object() {
        assert_eq!(parse_ld_json(None).unwrap(), json!({}));
    }

    #[test]
    fn numbers_from_strings() {
        assert_eq!(number(Some(&json!("8.8"))), Some(8.8));
        assert_eq!(count(Some(&json!("1,234"))), Some(1234));
        assert_eq!(count(Some(&json!(77))), Some(77));
        assert_eq!(number(None), None);
    }

    #[test]
    fn names_from_array_or_object() {
        let value = json!({
            "director": [{ "name": "奉俊昊 Joon-ho Bong" }, { "name": " " }],
            "creator": { "@type": "Organization", "name": "Barunson" }
        });
        assert_eq!(names_at(&value, "director"), vec!["奉俊昊 Joon-ho Bong"]);
        assert_eq!(names_at(&value, "creator"), vec!["Barunson"]);
        assert!(names_at(&value, "actor").is_empty());
    }

    #[test]
    fn strings_from_scalar_or_array() {
        let value = json!({ "genre": "Drama", "tags": ["a", "b"] });
        assert_eq!(strings_at(&value, "genre"), vec!["Drama"]);
        assert_eq!(strings_at(&value, "tags"), vec!["a", "b"]);
    }
}
