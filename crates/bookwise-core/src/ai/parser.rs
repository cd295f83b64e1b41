//! Turns raw provider replies into domain results.
//!
//! Providers are told to answer recommendation requests with bare JSON but often wrap
//! it in a sentence or a markdown fence. The payload is taken to be everything from
//! the first `{` to the last `}`, which assumes a single top-level object.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::Recommendation;
use crate::{Error, Result};

#[derive(Deserialize)]
struct RecommendationEnvelope {
    recommendations: Vec<RawRecommendation>,
}

#[derive(Deserialize)]
struct RawRecommendation {
    #[serde(deserialize_with = "scalar_string")]
    title: String,
    #[serde(deserialize_with = "scalar_string")]
    author: String,
    #[serde(deserialize_with = "scalar_string")]
    reason: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    tags: Vec<String>,
}

impl From<RawRecommendation> for Recommendation {
    fn from(raw: RawRecommendation) -> Self {
        Recommendation {
            title: raw.title,
            author: raw.author,
            reason: raw.reason,
            tags: raw.tags,
        }
    }
}

/// String form of a JSON scalar; objects, arrays and null have none
fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Models sometimes emit `"title": 1984`
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let found = value.to_string();
    scalar_text(value).ok_or_else(|| {
        serde::de::Error::custom(format!("expected a string or number, found {found}"))
    })
}

/// Anything other than an array means no tags; non-scalar elements are dropped
fn lenient_tags<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

/// The summary is the reply itself
pub fn parse_summary(raw: &str) -> Result<String> {
    let summary = raw.trim();
    if summary.is_empty() {
        return Err(Error::ProviderResponse("summary reply was empty".to_string()));
    }
    Ok(summary.to_string())
}

/// Extract the recommendation list from a reply that may surround the JSON with prose.
///
/// Every entry must carry `title`, `author` and `reason` as strings or numbers; one
/// bad entry fails the whole reply. A missing, null or non-array `tags` reads as empty.
pub fn parse_recommendations(raw: &str) -> Result<Vec<Recommendation>> {
    let span = json_object_span(raw)
        .ok_or_else(|| Error::malformed("no JSON object found in response", raw))?;

    let envelope: RecommendationEnvelope =
        serde_json::from_str(span).map_err(|e| Error::malformed(e.to_string(), raw))?;

    Ok(envelope
        .recommendations
        .into_iter()
        .map(Recommendation::from)
        .collect())
}

/// Slice from the first `{` through the last `}`
fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
