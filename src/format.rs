//! Output formatting utilities for markdown and JSON.

use crate::types::{AggregatedResult, Notification, NotificationKind, Template, TemplateDetail};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

fn format_ms(ms: Option<i64>) -> String {
    ms.and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Pretty JSON for any serializable value.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Format the template list as markdown.
pub fn format_templates_markdown(templates: &[Template]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Templates ({})\n\n", templates.len()));
    if templates.is_empty() {
        md.push_str("No templates imported yet.\n");
        return md;
    }

    for t in templates {
        let published = if t.is_published { "published" } else { "draft" };
        md.push_str(&format!(
            "- `{}` **{}** by {} ({}, {} responses, imported {})\n",
            t.external_id,
            t.title,
            t.author,
            published,
            t.total_responses,
            format_ms(t.last_import_at)
        ));
    }

    md
}

fn format_result_markdown(md: &mut String, r: &AggregatedResult) {
    md.push_str(&format!(
        "### {} `{}` ({} answers)\n",
        r.question_title, r.question_type, r.total_answers
    ));

    match r.question_type.to_lowercase().as_str() {
        "scale" | "rating" => {
            md.push_str(&format!(
                "- **average**: {:.2} (min {}, max {})\n",
                r.average_value, r.min_value, r.max_value
            ));
        }
        "date" => {
            md.push_str(&format!(
                "- **range**: {} .. {}\n",
                r.earliest_date, r.latest_date
            ));
        }
        "time" if !r.popular_time.is_empty() => {
            md.push_str(&format!(
                "- **popular time**: {} ({})\n",
                r.popular_time, r.popular_time_count
            ));
        }
        _ => {}
    }

    if !r.most_popular_answer.is_empty() {
        md.push_str(&format!(
            "- **most popular**: {} ({})\n",
            r.most_popular_answer, r.most_popular_count
        ));
    }
    for o in &r.option_counts {
        md.push_str(&format!("  - {}: {}\n", o.option, o.count));
    }
    for a in &r.popular_answers {
        md.push_str(&format!("  - \"{}\": {}\n", a.answer, a.count));
    }
    md.push('\n');
}

/// Format a template with its questions and results as markdown.
pub fn format_template_detail_markdown(detail: &TemplateDetail) -> String {
    let t = &detail.template;
    let mut md = String::new();

    md.push_str(&format!("# {}\n", t.title));
    md.push_str(&format!("- **id**: `{}`\n", t.external_id));
    md.push_str(&format!("- **author**: {}\n", t.author));
    md.push_str(&format!("- **published**: {}\n", t.is_published));
    md.push_str(&format!("- **responses**: {}\n", t.total_responses));
    md.push_str(&format!("- **created**: {}\n", format_ms(t.created_at)));
    md.push_str(&format!("- **last import**: {}\n", format_ms(t.last_import_at)));

    if !t.description.is_empty() {
        md.push('\n');
        md.push_str(&t.description);
        md.push('\n');
    }

    md.push_str(&format!("\n## Questions ({})\n", detail.questions.len()));
    for q in &detail.questions {
        let required = if q.is_required { " *" } else { "" };
        md.push_str(&format!(
            "{}. {}{} `{}`\n",
            q.display_order, q.title, required, q.question_type
        ));
    }

    md.push_str(&format!("\n## Aggregated results ({})\n\n", detail.results.len()));
    for r in &detail.results {
        format_result_markdown(&mut md, r);
    }

    md
}

/// One-line rendering of an action notification.
pub fn format_notification(notification: &Notification) -> String {
    let marker = match notification.kind {
        NotificationKind::Success => "ok",
        NotificationKind::Danger => "error",
    };
    format!(
        "[{}] {}: {}",
        marker, notification.title, notification.message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OptionCount, Question};

    fn template() -> Template {
        Template {
            id: 1,
            external_id: "tpl-1".into(),
            title: "Customer survey".into(),
            description: "Quarterly".into(),
            author: "Ann".into(),
            is_published: true,
            total_responses: 12,
            created_at: Some(1_709_287_200_000),
            api_token: Some("secret".into()),
            last_import_at: None,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("md"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_templates_markdown() {
        let md = format_templates_markdown(&[template()]);
        assert!(md.starts_with("# Templates (1)"));
        assert!(md.contains("`tpl-1` **Customer survey** by Ann (published, 12 responses"));
    }

    #[test]
    fn test_detail_markdown_lists_children() {
        let detail = TemplateDetail {
            template: template(),
            questions: vec![Question {
                id: 1,
                template_id: 1,
                external_id: "q1".into(),
                title: "Pick one".into(),
                description: String::new(),
                question_type: "singleChoice".into(),
                display_order: 1,
                is_required: true,
            }],
            results: vec![AggregatedResult {
                question_external_id: "q1".into(),
                question_title: "Pick one".into(),
                question_type: "singleChoice".into(),
                most_popular_answer: "A".into(),
                most_popular_count: 10,
                option_counts: vec![OptionCount {
                    option: "A".into(),
                    count: 10,
                }],
                ..Default::default()
            }],
        };

        let md = format_template_detail_markdown(&detail);
        assert!(md.contains("1. Pick one * `singleChoice`"));
        assert!(md.contains("- **most popular**: A (10)"));
        assert!(md.contains("  - A: 10"));
        assert!(md.contains("- **created**: 2024-03-01 10:00 UTC"));
    }

    #[test]
    fn test_json_omits_token() {
        let json = to_json(&template()).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"external_id\": \"tpl-1\""));
    }

    #[test]
    fn test_format_notification() {
        let n = Notification::success("Import Successful", "Successfully imported 2 templates");
        assert_eq!(
            format_notification(&n),
            "[ok] Import Successful: Successfully imported 2 templates"
        );
    }
}
