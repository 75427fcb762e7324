//! Paper records and tolerant field access.
//!
//! A record is one JSON object per file. Nothing about its shape is trusted:
//! every accessor here falls back to an empty/default value instead of failing.

use chrono::{DateTime, Datelike, NaiveDate};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Keys extracted into the header block and skipped by the section loop.
pub const METADATA_KEYS: &[&str] = &["paper_title", "authors", "published", "link"];

/// Fallback title when neither `paper_title` nor an id is available
pub const UNTITLED: &str = "Untitled Paper";

static YEAR_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").ok());

/// Date layouts seen in `published` fields, tried before the year regex.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y", "%b %d, %Y"];

/// One structured paper document, read-only once loaded.
///
/// Section order is the order keys appear in the source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PaperRecord {
    sections: Map<String, Value>,
}

impl PaperRecord {
    /// Wrap a JSON value. Non-object documents become a single `content` section
    /// so they still reach the raw-dump fallback instead of being dropped.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(sections) => Self { sections },
            other => {
                let mut sections = Map::new();
                sections.insert("content".to_string(), other);
                Self { sections }
            }
        }
    }

    /// Parse a record from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Value>(text).map(Self::from_value)
    }

    /// Parse a record from raw file bytes; invalid UTF-8 is a parse error.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice::<Value>(bytes).map(Self::from_value)
    }

    /// Section value by key, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.sections.get(key)
    }

    /// Non-metadata sections in document order.
    pub fn body_sections(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.sections
            .iter()
            .filter(|(key, _)| !METADATA_KEYS.contains(&key.as_str()))
    }

    pub fn title(&self) -> Option<String> {
        self.metadata("paper_title")
    }

    pub fn authors(&self) -> Option<String> {
        self.metadata("authors")
    }

    pub fn published(&self) -> Option<String> {
        self.metadata("published")
    }

    pub fn link(&self) -> Option<String> {
        self.metadata("link")
    }

    /// Publication year parsed from `published`.
    pub fn year(&self) -> Option<i32> {
        self.published().as_deref().and_then(parse_year)
    }

    /// Subject names from `subject_area.areas`.
    ///
    /// Bare-string areas name themselves; objects without a usable `name`
    /// map to `"Unknown"`.
    pub fn subjects(&self) -> Vec<String> {
        let areas = self.get("subject_area").map(|s| field(s, "areas"));
        as_items(areas.unwrap_or(&Value::Null))
            .into_iter()
            .map(|area| {
                let name = match area {
                    Value::Object(_) => text(field(area, "name")),
                    other => text(other),
                };
                if name.trim().is_empty() {
                    "Unknown".to_string()
                } else {
                    name
                }
            })
            .collect()
    }

    /// Pretty JSON in document order, as sent to the survey service.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.sections).unwrap_or_default()
    }

    /// Non-empty metadata scalar.
    fn metadata(&self, key: &str) -> Option<String> {
        self.get(key).map(text).filter(|s| !s.trim().is_empty())
    }
}

/// Field of an object, or `Null` when the value is not an object or lacks the key.
pub fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value {
        Value::Object(map) => map.get(key).unwrap_or(&Value::Null),
        _ => &Value::Null,
    }
}

/// Display text for any JSON value.
///
/// Strings are returned as-is, `null` becomes empty, containers become compact JSON.
pub fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Items of a list-ish field.
///
/// A sequence yields its elements, a single object or scalar is promoted to a
/// one-element list, and `null` (or an empty string) yields nothing.
pub fn as_items(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => vec![other],
    }
}

/// Year from a free-form date string.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.year());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date.year());
        }
    }

    YEAR_REGEX
        .as_ref()?
        .find(raw)
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_order_preserved() {
        let record =
            PaperRecord::from_json(r#"{"zeta": 1, "paper_title": "T", "alpha": 2, "mid": 3}"#)
                .unwrap();
        let keys: Vec<&str> = record.body_sections().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_metadata_accessors() {
        let record = PaperRecord::from_value(json!({
            "paper_title": "Graph Agents",
            "authors": "",
            "published": "2023-05-01",
            "link": null
        }));
        assert_eq!(record.title().as_deref(), Some("Graph Agents"));
        assert_eq!(record.authors(), None);
        assert_eq!(record.link(), None);
        assert_eq!(record.year(), Some(2023));
    }

    #[test]
    fn test_non_object_document_is_wrapped() {
        let record = PaperRecord::from_value(json!([1, 2]));
        assert_eq!(record.get("content"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_subjects_tolerate_shapes() {
        let record = PaperRecord::from_value(json!({
            "subject_area": {"areas": [{"name": "NLP"}, "Biology", {"description": "x"}]}
        }));
        assert_eq!(record.subjects(), vec!["NLP", "Biology", "Unknown"]);

        let single = PaperRecord::from_value(json!({"subject_area": {"areas": {"name": "Chem"}}}));
        assert_eq!(single.subjects(), vec!["Chem"]);

        let broken = PaperRecord::from_value(json!({"subject_area": "oops"}));
        assert!(broken.subjects().is_empty());
    }

    #[test]
    fn test_as_items_promotion() {
        let obj = json!({"name": "BLEU"});
        assert_eq!(as_items(&obj), vec![&obj]);
        assert!(as_items(&Value::Null).is_empty());
        assert!(as_items(&json!("")).is_empty());
        assert_eq!(as_items(&json!(["a", "b"])).len(), 2);
    }

    #[test]
    fn test_text_conversions() {
        assert_eq!(text(&Value::Null), "");
        assert_eq!(text(&json!("x")), "x");
        assert_eq!(text(&json!(3)), "3");
        assert_eq!(text(&json!(["a"])), r#"["a"]"#);
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year("2024-02-10T08:00:00Z"), Some(2024));
        assert_eq!(parse_year("March 3, 2021"), Some(2021));
        assert_eq!(parse_year("12 June 2019"), Some(2019));
        assert_eq!(parse_year("Published in NeurIPS 2022 proceedings"), Some(2022));
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year(""), None);
    }
}
