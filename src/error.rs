//! Structured error types for user-facing actions.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,

    // Remote errors
    ConnectionFailed,
    UnexpectedStatus,
    ImportFailed,

    // Not found errors
    TemplateNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Structured error shown to the user when an action fails.
#[derive(Debug, Serialize)]
pub struct ActionError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Underlying cause chain, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ActionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(label: &str, field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", label),
        )
        .with_field(field)
    }

    pub fn connection_failed(err: impl std::error::Error) -> Self {
        Self::new(
            ErrorCode::ConnectionFailed,
            format!("Connection failed: {}", err),
        )
        .with_details(source_chain(&err))
    }

    pub fn unexpected_status(status: u16) -> Self {
        Self::new(
            ErrorCode::UnexpectedStatus,
            format!("API returned status code: {}", status),
        )
    }

    pub fn import_failed(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ImportFailed, format!("Import failed: {}", err))
            .with_details(format!("{:#}", err))
    }

    pub fn template_not_found(external_id: &str) -> Self {
        Self::new(
            ErrorCode::TemplateNotFound,
            format!("Template not found: {}", external_id),
        )
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

/// Render an error and its sources as `outer: inner: ...`, skipping
/// sources that repeat their parent's message.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ActionError {}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ActionError>() {
            Ok(action_err) => action_err,
            Err(err) => ActionError::internal(err),
        }
    }
}

/// Result type for user-facing actions.
pub type ActionResult<T> = std::result::Result<T, ActionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_field() {
        let err = ActionError::missing_field("API Token", "api_token");
        assert_eq!(err.code, ErrorCode::MissingRequiredField);
        assert_eq!(err.message, "API Token is required");
        assert_eq!(err.field.as_deref(), Some("api_token"));
    }

    #[test]
    fn test_serializes_code_screaming_snake() {
        let err = ActionError::unexpected_status(403);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "UNEXPECTED_STATUS");
        assert_eq!(json["message"], "API returned status code: 403");
        assert!(json.get("field").is_none());
        assert!(json.get("details").is_none());
    }

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl std::error::Error for Refused {}

    #[derive(Debug)]
    struct SendFailed(Refused);

    impl fmt::Display for SendFailed {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for SendFailed {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_connection_failed_carries_source_chain() {
        let err = ActionError::connection_failed(SendFailed(Refused));
        assert_eq!(err.code, ErrorCode::ConnectionFailed);
        assert_eq!(err.message, "Connection failed: error sending request");
        assert_eq!(
            err.details.as_deref(),
            Some("error sending request: connection refused")
        );

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["details"], "error sending request: connection refused");
    }

    #[test]
    fn test_import_failed_details_show_context_chain() {
        let cause =
            anyhow::anyhow!("API returned status code: 503").context("Failed to import templates");
        let err = ActionError::import_failed(cause);
        assert_eq!(err.message, "Import failed: Failed to import templates");
        assert_eq!(
            err.details.as_deref(),
            Some("Failed to import templates: API returned status code: 503")
        );
    }

    #[test]
    fn test_from_anyhow_preserves_action_error() {
        let err: anyhow::Error = ActionError::template_not_found("tpl-9").into();
        let back: ActionError = err.into();
        assert_eq!(back.code, ErrorCode::TemplateNotFound);

        let back: ActionError = anyhow::anyhow!("disk full").into();
        assert_eq!(back.code, ErrorCode::InternalError);
        assert_eq!(back.message, "disk full");
    }
}
