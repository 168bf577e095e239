//! User-facing import and connection-test actions.

use crate::api::{ApiError, FormFlowApi, HttpClient};
use crate::config::ApiConfig;
use crate::db::Database;
use crate::error::{ActionError, ActionResult};
use crate::sync::Syncer;
use crate::types::Notification;
use tracing::{info, warn};

/// Credentials entered for one import or connection test.
#[derive(Debug, Clone)]
pub struct ImportWizard {
    pub api_token: String,
    pub api_url: String,
    settings: ApiConfig,
}

impl ImportWizard {
    pub fn new(api_token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: api_url.into(),
            settings: ApiConfig::default(),
        }
    }

    /// Use timeouts from configuration.
    pub fn with_settings(mut self, settings: ApiConfig) -> Self {
        self.settings = settings;
        self
    }

    fn token(&self) -> &str {
        self.api_token.trim()
    }

    fn url(&self) -> &str {
        self.api_url.trim()
    }

    pub fn validate_for_import(&self) -> ActionResult<()> {
        if self.token().is_empty() {
            return Err(ActionError::missing_field("API Token", "api_token"));
        }
        if self.url().is_empty() {
            return Err(ActionError::missing_field("API URL", "api_url"));
        }
        Ok(())
    }

    pub fn validate_for_test(&self) -> ActionResult<()> {
        if self.token().is_empty() || self.url().is_empty() {
            let field = if self.token().is_empty() {
                "api_token"
            } else {
                "api_url"
            };
            return Err(ActionError::new(
                crate::error::ErrorCode::MissingRequiredField,
                "Please fill in both API Token and API URL",
            )
            .with_field(field));
        }
        Ok(())
    }

    fn client(&self) -> Result<HttpClient, ApiError> {
        HttpClient::new(self.settings.client_config(self.token(), self.url()))
    }

    /// Issue a bare list request and report on the HTTP status.
    pub async fn test_connection(&self) -> ActionResult<Notification> {
        self.validate_for_test()?;
        let client = self.client().map_err(ActionError::connection_failed)?;

        match client.probe().await {
            Ok(200) => {
                info!(url = %self.url(), "Connection test succeeded");
                Ok(Notification::success(
                    "Connection Successful",
                    "API connection is working correctly",
                ))
            }
            Ok(status) => {
                warn!(url = %self.url(), status, "Connection test got unexpected status");
                Err(ActionError::unexpected_status(status))
            }
            Err(e) if e.is_transport() => {
                warn!(url = %self.url(), error = %e, "Connection test failed");
                Err(ActionError::connection_failed(e))
            }
            Err(e) => Err(ActionError::internal(format!("Test failed: {}", e))),
        }
    }

    /// Run Template Sync and report the number of templates imported.
    pub async fn import(&self, db: &Database) -> ActionResult<Notification> {
        self.validate_for_import()?;
        let client = self.client().map_err(ActionError::import_failed)?;
        let syncer = Syncer::new(db.clone(), client);

        match syncer.import_templates().await {
            Ok(count) => Ok(Notification::success(
                "Import Successful",
                format!("Successfully imported {} templates", count),
            )),
            Err(e) => Err(ActionError::import_failed(e)),
        }
    }
}

/// Refresh one template's aggregated results with its stored credential.
pub async fn refresh_template(
    db: &Database,
    settings: &ApiConfig,
    external_id: &str,
) -> ActionResult<Notification> {
    let template = db
        .get_template_by_external_id(external_id)
        .map_err(ActionError::database)?
        .ok_or_else(|| ActionError::template_not_found(external_id))?;

    let token = template
        .api_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ActionError::missing_field("API Token", "api_token"))?;

    let client = HttpClient::new(settings.client_config(&token, &settings.base_url))
        .map_err(ActionError::connection_failed)?;
    let syncer = Syncer::new(db.clone(), client);
    let stored = syncer.sync_aggregated(external_id).await?;

    Ok(Notification::success(
        "Refresh Complete",
        format!("{} aggregated results stored for {}", stored, template.title),
    ))
}
