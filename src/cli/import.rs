//! Credential arguments shared by `import` and `test-connection`.

use crate::config::ApiConfig;
use clap::Args;

/// FormFlow credentials; unset values fall back to configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// FormFlow API token (falls back to FORMFLOW_API_TOKEN / config)
    #[arg(long)]
    pub token: Option<String>,

    /// FormFlow API base URL (falls back to FORMFLOW_API_URL / config)
    #[arg(long)]
    pub url: Option<String>,
}

impl CredentialArgs {
    /// Resolve the token and URL to use. Missing values resolve to empty strings
    /// so that validation can name the missing field.
    pub fn resolve(&self, api: &ApiConfig) -> (String, String) {
        let token = self
            .token
            .clone()
            .or_else(|| api.token.clone())
            .unwrap_or_default();
        let url = self.url.clone().unwrap_or_else(|| api.base_url.clone());
        (token, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let api = ApiConfig {
            token: Some("from-config".into()),
            ..ApiConfig::default()
        };
        let args = CredentialArgs {
            token: Some("from-flag".into()),
            url: Some("http://localhost:9000".into()),
        };
        assert_eq!(
            args.resolve(&api),
            ("from-flag".to_string(), "http://localhost:9000".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_config() {
        let api = ApiConfig::default();
        let (token, url) = CredentialArgs::default().resolve(&api);
        assert_eq!(token, "");
        assert_eq!(url, api.base_url);
    }
}
