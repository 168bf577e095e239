//! HTTP transport for the FormFlow API.

use super::payload::{AggregatedResponse, TemplatePayload};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Header carrying the credential token.
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Default per-request deadline for data fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-request deadline for the connection test.
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport-level failure talking to FormFlow.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API returned status code: {0}")]
    Status(u16),

    /// The body was not the expected JSON shape.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status(code) => Some(*code),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Read side of the FormFlow API used by the sync layer.
#[async_trait]
pub trait FormFlowApi: Send + Sync {
    /// Credential the client authenticates with.
    fn credential(&self) -> &str;

    /// `GET /api/odoo/templates`.
    async fn list_templates(&self) -> Result<Vec<TemplatePayload>, ApiError>;

    /// `GET /api/odoo/templates/{id}/aggregated`. Anything but HTTP 200 is an error.
    async fn aggregated(&self, template_external_id: &str)
    -> Result<AggregatedResponse, ApiError>;

    /// Bare list request returning only the status code.
    async fn probe(&self) -> Result<u16, ApiError>;
}

/// Connection settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: String,
    pub fetch_timeout: Duration,
    pub test_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            test_timeout: DEFAULT_TEST_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, fetch: Duration, test: Duration) -> Self {
        self.fetch_timeout = fetch;
        self.test_timeout = test;
        self
    }
}

/// `reqwest`-backed FormFlow client. One request in flight at a time.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    fetch_timeout: Duration,
    test_timeout: Duration,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
            fetch_timeout: config.fetch_timeout,
            test_timeout: config.test_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn templates_url(&self) -> String {
        format!("{}/api/odoo/templates", self.base_url)
    }

    fn aggregated_url(&self, template_external_id: &str) -> String {
        format!(
            "{}/api/odoo/templates/{}/aggregated",
            self.base_url,
            urlencoding::encode(template_external_id)
        )
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, ApiError> {
        debug!(url = %url, timeout_s = timeout.as_secs(), "GET");
        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, &self.api_token)
            .timeout(timeout)
            .send()
            .await?;
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        accept: impl Fn(StatusCode) -> bool,
    ) -> Result<T, ApiError> {
        let response = self.get(url, self.fetch_timeout).await?;
        let status = response.status();
        if !accept(status) {
            return Err(ApiError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl FormFlowApi for HttpClient {
    fn credential(&self) -> &str {
        &self.api_token
    }

    async fn list_templates(&self) -> Result<Vec<TemplatePayload>, ApiError> {
        let url = self.templates_url();
        self.get_json(&url, |status| status.is_success()).await
    }

    async fn aggregated(
        &self,
        template_external_id: &str,
    ) -> Result<AggregatedResponse, ApiError> {
        let url = self.aggregated_url(template_external_id);
        self.get_json(&url, |status| status == StatusCode::OK).await
    }

    async fn probe(&self) -> Result<u16, ApiError> {
        let url = self.templates_url();
        let response = self.get(&url, self.test_timeout).await?;
        Ok(response.status().as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = HttpClient::new(ClientConfig::new("https://example.test///", "tok")).unwrap();
        assert_eq!(client.base_url(), "https://example.test");
        assert_eq!(
            client.templates_url(),
            "https://example.test/api/odoo/templates"
        );
        assert_eq!(
            client.aggregated_url("abc"),
            "https://example.test/api/odoo/templates/abc/aggregated"
        );
    }

    #[test]
    fn test_aggregated_url_encodes_id_as_one_segment() {
        let client = HttpClient::new(ClientConfig::new("https://example.test", "tok")).unwrap();
        assert_eq!(
            client.aggregated_url("a/b?c#d"),
            "https://example.test/api/odoo/templates/a%2Fb%3Fc%23d/aggregated"
        );
        assert_eq!(
            client.aggregated_url("6f1c2a9e-0d4b-4f7a-9a61-3c2e1b0d9f10"),
            "https://example.test/api/odoo/templates/6f1c2a9e-0d4b-4f7a-9a61-3c2e1b0d9f10/aggregated"
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status(403);
        assert_eq!(err.to_string(), "API returned status code: 403");
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_transport());
    }
}
