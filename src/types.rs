//! Core record types for the FormFlow mirror.

use serde::{Deserialize, Serialize};

/// A remote survey template mirrored locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    /// Identifier assigned by FormFlow; the upsert key.
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub is_published: bool,
    pub total_responses: i64,
    /// Remote creation time in milliseconds since the epoch.
    pub created_at: Option<i64>,
    /// Credential used by the last import, reused by refresh.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub last_import_at: Option<i64>,
}

/// A question belonging to a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub template_id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub question_type: String,
    pub display_order: i64,
    pub is_required: bool,
}

/// Ranked tally of one choice option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionCount {
    pub option: String,
    pub count: i64,
}

/// Ranked free-text (or time) answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularAnswer {
    pub answer: String,
    pub count: i64,
}

/// Precomputed statistics for one question across all responses.
///
/// Only the summary fields relevant to `question_type` are populated; the rest
/// keep their empty defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub question_external_id: String,
    pub question_title: String,
    pub question_type: String,
    /// Raw `aggregatedResults` object as received.
    pub aggregated_data: String,
    pub total_answers: i64,
    pub average_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub earliest_date: String,
    pub latest_date: String,
    pub popular_time: String,
    pub popular_time_count: i64,
    pub most_popular_answer: String,
    pub most_popular_count: i64,
    /// Descending by count.
    pub option_counts: Vec<OptionCount>,
    /// Descending by count.
    pub popular_answers: Vec<PopularAnswer>,
}

/// Template with its children, for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateDetail {
    pub template: Template,
    pub questions: Vec<Question>,
    pub results: Vec<AggregatedResult>,
}

/// Outcome level of a user-facing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Danger,
}

/// Message shown to the user after an action completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Success,
        }
    }

    pub fn danger(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Danger,
        }
    }
}
