//! List responses come either as a bare JSON array or wrapped in a
//! `{count, next, previous, results}` envelope; both unwrap to `Page`.

use reqwest::Url;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
    results: Vec<T>,
}

/// The shape is picked from the JSON value itself, so a bad item inside
/// `results` reports its own field error.
impl<'de, T: DeserializeOwned> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(_) => {
                let results: Vec<T> = serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok(Page {
                    count: results.len() as u64,
                    next: None,
                    previous: None,
                    results,
                })
            }
            Value::Object(_) => {
                let envelope: Envelope<T> =
                    serde_json::from_value(value).map_err(D::Error::custom)?;
                Ok(Page {
                    count: envelope
                        .count
                        .unwrap_or(envelope.results.len() as u64),
                    next: envelope.next,
                    previous: envelope.previous,
                    results: envelope.results,
                })
            }
            other => Err(D::Error::custom(format!(
                "expected a list or a paginated object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// `page` query parameter of the next-page link, if any.
    pub fn next_page(&self) -> Option<u32> {
        page_param(self.next.as_deref()?)
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

fn page_param(link: &str) -> Option<u32> {
    // Links may be absolute or relative to the API root.
    let url = Url::parse(link)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(link)))
        .ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_envelope() {
        let page: Page<i64> = serde_json::from_str(
            r#"{"count": 42, "next": "https://ops.example.com/api/clients/?page=3", "previous": "https://ops.example.com/api/clients/?page=1", "results": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(page.count, 42);
        assert_eq!(page.results, vec![1, 2]);
        assert!(page.has_next());
        assert_eq!(page.next_page(), Some(3));
    }

    #[test]
    fn test_bare_array() {
        let page: Page<i64> = serde_json::from_str("[5, 6, 7]").unwrap();
        assert_eq!(page.count, 3);
        assert!(!page.has_next());
        assert_eq!(page.into_results(), vec![5, 6, 7]);
    }

    #[test]
    fn test_envelope_without_count_and_relative_link() {
        let page: Page<i64> =
            serde_json::from_str(r#"{"next": "/api/jobs/?status=open&page=2", "results": [1]}"#)
                .unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.next_page(), Some(2));
    }

    #[test]
    fn test_rejects_other_shapes() {
        let err = serde_json::from_str::<Page<i64>>(r#"{"detail": "nope"}"#).unwrap_err();
        assert!(err.to_string().contains("missing field `results`"), "{err}");

        let err = serde_json::from_str::<Page<i64>>(r#""nope""#).unwrap_err();
        assert!(err.to_string().contains("got a string"), "{err}");
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        #[allow(dead_code)]
        name: String,
    }

    #[test]
    fn test_bad_item_reports_field_error() {
        let err = serde_json::from_str::<Page<Named>>(
            r#"{"count": 1, "next": null, "results": [{"title": "no name"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing field `name`"), "{err}");

        let err = serde_json::from_str::<Page<Named>>(r#"[{"name": 7}]"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"), "{err}");
    }
}
