//! Wire types for the FormFlow Odoo API.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One entry of `GET /api/odoo/templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub author: String,
    pub is_published: bool,
    pub total_responses: i64,
    pub created_at: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<QuestionPayload>,
}

impl TemplatePayload {
    /// Remote creation time in milliseconds.
    pub fn created_at_ms(&self) -> Result<i64> {
        parse_timestamp_ms(&self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Type tag. The template list may send the numeric enum value or null.
    #[serde(rename = "type", deserialize_with = "type_tag")]
    pub question_type: String,
    #[serde(default = "default_order")]
    pub order: i64,
    #[serde(default)]
    pub is_required: bool,
}

fn default_order() -> i64 {
    1
}

/// Body of `GET /api/odoo/templates/{id}/aggregated`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub questions: Vec<QuestionAggregate>,
}

/// Aggregated statistics for a single question.
///
/// `aggregated_results` is kept untyped here: its shape depends on
/// `question_type` and it is decoded per kind by the aggregation mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAggregate {
    #[serde(deserialize_with = "string_or_number")]
    pub question_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default = "empty_object")]
    pub aggregated_results: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Treat an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ids and type tags arrive as strings, but numbers are accepted too.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_string(Value::deserialize(deserializer)?)
}

/// Like [`string_or_number`], with `null` read as an empty tag.
fn type_tag<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        other => scalar_string(other),
    }
}

fn scalar_string<E: serde::de::Error>(value: Value) -> std::result::Result<String, E> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(E::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// Parse an ISO-8601 timestamp into milliseconds since the epoch.
///
/// Accepts RFC 3339 (including a `Z` suffix). A timestamp without an offset
/// is taken as UTC.
pub fn parse_timestamp_ms(raw: &str) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    Err(anyhow!("Invalid createdAt timestamp: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_payload_defaults() {
        let payload: TemplatePayload = serde_json::from_value(json!({
            "id": "tpl-1",
            "title": "Customer survey",
            "description": null,
            "author": "Ann",
            "isPublished": true,
            "totalResponses": 12,
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .unwrap();

        assert_eq!(payload.description, "");
        assert!(payload.questions.is_empty());
        assert_eq!(payload.created_at_ms().unwrap(), 1_709_287_200_000);
    }

    #[test]
    fn test_question_payload_defaults() {
        let q: QuestionPayload = serde_json::from_value(json!({
            "id": "q1",
            "title": "Name",
            "type": "shortText"
        }))
        .unwrap();

        assert_eq!(q.order, 1);
        assert!(!q.is_required);
        assert_eq!(q.question_type, "shortText");
    }

    #[test]
    fn test_template_payload_missing_required_key() {
        let result: std::result::Result<TemplatePayload, _> = serde_json::from_value(json!({
            "id": "tpl-1",
            "description": "",
            "author": "Ann",
            "isPublished": true,
            "totalResponses": 0,
            "createdAt": "2024-03-01T10:00:00Z"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let q: QuestionPayload = serde_json::from_value(json!({
            "id": 42,
            "title": "Age",
            "type": "scale"
        }))
        .unwrap();
        assert_eq!(q.id, "42");
    }

    #[test]
    fn test_template_list_entry_with_numeric_type() {
        let payload: TemplatePayload = serde_json::from_value(json!({
            "id": "6f1c2a9e-0d4b-4f7a-9a61-3c2e1b0d9f10",
            "title": "Feedback",
            "description": "",
            "author": "Ann",
            "createdAt": "2024-03-01T10:00:00.123",
            "isPublished": true,
            "totalResponses": 4,
            "questions": [
                {"id": "q1", "title": "T", "description": "", "type": 3, "order": 1, "isRequired": false},
                {"id": "q2", "title": "U", "description": "", "type": null, "order": 2, "isRequired": true},
                {"id": "q3", "title": "Invalid question data", "description": "", "type": "Unknown", "order": 3, "isRequired": false}
            ]
        }))
        .unwrap();

        let types: Vec<&str> = payload.questions.iter().map(|q| q.question_type.as_str()).collect();
        assert_eq!(types, ["3", "", "Unknown"]);
        assert_eq!(payload.created_at_ms().unwrap(), 1_709_287_200_123);
    }

    #[test]
    fn test_type_tag_rejects_non_scalar() {
        let result: std::result::Result<QuestionPayload, _> = serde_json::from_value(json!({
            "id": "q1",
            "title": "T",
            "type": ["scale"]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_question_aggregate_defaults_results_to_object() {
        let q: QuestionAggregate = serde_json::from_value(json!({
            "questionId": "q1",
            "title": "Rate us",
            "type": "scale"
        }))
        .unwrap();
        assert!(q.aggregated_results.is_object());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let with_z = parse_timestamp_ms("2024-03-01T10:00:00Z").unwrap();
        let with_offset = parse_timestamp_ms("2024-03-01T12:00:00+02:00").unwrap();
        let naive = parse_timestamp_ms("2024-03-01T10:00:00.000").unwrap();
        assert_eq!(with_z, with_offset);
        assert_eq!(with_z, naive);
        assert!(parse_timestamp_ms("yesterday").is_err());
    }
}
