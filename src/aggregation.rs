//! Mapping of aggregated-results payloads into local records.
//!
//! The type tag of each question selects a [`QuestionKind`]; the untyped
//! `aggregatedResults` object is then decoded into the statistics shape for
//! that kind. Unknown tags fall through to [`QuestionKind::Other`], which keeps
//! only the common fields.

use crate::api::payload::{AggregatedResponse, QuestionAggregate, null_as_default};
use crate::types::{AggregatedResult, OptionCount, PopularAnswer};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

/// Closed set of question type tags understood by the mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Scale,
    Rating,
    ShortText,
    LongText,
    SingleChoice,
    Dropdown,
    MultipleChoice,
    Date,
    Time,
    Other(String),
}

impl QuestionKind {
    /// Decode a type tag, case-insensitively.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "scale" => QuestionKind::Scale,
            "rating" => QuestionKind::Rating,
            "shorttext" => QuestionKind::ShortText,
            "longtext" => QuestionKind::LongText,
            "singlechoice" => QuestionKind::SingleChoice,
            "dropdown" => QuestionKind::Dropdown,
            "multiplechoice" => QuestionKind::MultipleChoice,
            "date" => QuestionKind::Date,
            "time" => QuestionKind::Time,
            other => QuestionKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            QuestionKind::Scale => "scale",
            QuestionKind::Rating => "rating",
            QuestionKind::ShortText => "shorttext",
            QuestionKind::LongText => "longtext",
            QuestionKind::SingleChoice => "singlechoice",
            QuestionKind::Dropdown => "dropdown",
            QuestionKind::MultipleChoice => "multiplechoice",
            QuestionKind::Date => "date",
            QuestionKind::Time => "time",
            QuestionKind::Other(tag) => tag.as_str(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommonStats {
    #[serde(default, deserialize_with = "null_as_default")]
    total_answers: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub min: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub max: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_popular_answers: Vec<AnswerEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub option: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub option_counts: Vec<OptionEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub earliest_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub latest_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_popular_times: Vec<TimeEntry>,
}

/// Type-dependent statistics decoded from `aggregatedResults`.
#[derive(Debug)]
pub enum QuestionStats {
    /// `scale` and `rating`.
    Numeric(ScaleStats),
    /// `shorttext` and `longtext`.
    Text(TextStats),
    /// `singlechoice` and `dropdown`: summary plus option rows.
    SingleChoice(ChoiceStats),
    /// `multiplechoice`: option rows only, no summary.
    MultipleChoice(ChoiceStats),
    Date(DateStats),
    Time(TimeStats),
    Other,
}

impl QuestionStats {
    pub fn decode(kind: &QuestionKind, raw: &Value) -> Result<Self> {
        let stats = match kind {
            QuestionKind::Scale | QuestionKind::Rating => QuestionStats::Numeric(decode(raw)?),
            QuestionKind::ShortText | QuestionKind::LongText => QuestionStats::Text(decode(raw)?),
            QuestionKind::SingleChoice | QuestionKind::Dropdown => {
                QuestionStats::SingleChoice(decode(raw)?)
            }
            QuestionKind::MultipleChoice => QuestionStats::MultipleChoice(decode(raw)?),
            QuestionKind::Date => QuestionStats::Date(decode(raw)?),
            QuestionKind::Time => QuestionStats::Time(decode(raw)?),
            QuestionKind::Other(_) => QuestionStats::Other,
        };
        Ok(stats)
    }
}

fn decode<T: DeserializeOwned + Default>(raw: &Value) -> Result<T> {
    if raw.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(raw)?)
}

fn option_rows(entries: &[OptionEntry]) -> Vec<OptionCount> {
    entries
        .iter()
        .map(|e| OptionCount {
            option: e.option.clone(),
            count: e.count,
        })
        .collect()
}

/// Map one question entry of the aggregated response.
pub fn map_question(question: &QuestionAggregate) -> Result<AggregatedResult> {
    let raw = &question.aggregated_results;
    let kind = QuestionKind::from_tag(&question.question_type);
    let common: CommonStats = decode(raw)
        .with_context(|| format!("question {}: invalid totals", question.question_id))?;
    let stats = QuestionStats::decode(&kind, raw)
        .with_context(|| format!("question {}: invalid {} stats", question.question_id, kind.as_str()))?;

    let mut result = AggregatedResult {
        question_external_id: question.question_id.clone(),
        question_title: question.title.clone(),
        question_type: question.question_type.clone(),
        aggregated_data: serde_json::to_string(raw)?,
        total_answers: common.total_answers,
        ..Default::default()
    };

    match stats {
        QuestionStats::Numeric(s) => {
            result.average_value = s.average;
            result.min_value = s.min;
            result.max_value = s.max;
        }
        QuestionStats::Text(s) => {
            if let Some(top) = s.most_popular_answers.first() {
                result.most_popular_answer = top.answer.clone();
                result.most_popular_count = top.count;
            }
            result.popular_answers = s
                .most_popular_answers
                .into_iter()
                .map(|e| PopularAnswer {
                    answer: e.answer,
                    count: e.count,
                })
                .collect();
        }
        QuestionStats::SingleChoice(s) => {
            if let Some(top) = s.option_counts.first() {
                result.most_popular_answer = top.option.clone();
                result.most_popular_count = top.count;
            }
            result.option_counts = option_rows(&s.option_counts);
        }
        QuestionStats::MultipleChoice(s) => {
            result.option_counts = option_rows(&s.option_counts);
        }
        QuestionStats::Date(s) => {
            result.earliest_date = s.earliest_date;
            result.latest_date = s.latest_date;
        }
        QuestionStats::Time(s) => {
            if let Some(top) = s.most_popular_times.first() {
                result.popular_time = top.time.clone();
                result.popular_time_count = top.count;
            }
            result.popular_answers = s
                .most_popular_times
                .into_iter()
                .map(|e| PopularAnswer {
                    answer: e.time,
                    count: e.count,
                })
                .collect();
        }
        QuestionStats::Other => {}
    }

    // Stable: equal counts keep payload order.
    result.option_counts.sort_by(|a, b| b.count.cmp(&a.count));
    result.popular_answers.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(result)
}

/// Map a whole aggregated response. Fails as a unit.
pub fn map_response(response: &AggregatedResponse) -> Result<Vec<AggregatedResult>> {
    let mut seen = HashSet::new();
    let mut results = Vec::with_capacity(response.questions.len());
    for question in &response.questions {
        if !seen.insert(question.question_id.as_str()) {
            return Err(anyhow!(
                "Duplicate aggregated result for question {}",
                question.question_id
            ));
        }
        results.push(map_question(question)?);
    }
    Ok(results)
}
