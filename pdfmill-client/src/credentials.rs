//! Per-tenant API credentials and environment selection.

use crate::error::{ClientResult, PdfClientError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

/// Production base URL.
pub const PRODUCTION_BASE_URL: &str = "https://api.pdfmill.com/";

/// Staging base URL.
pub const STAGING_BASE_URL: &str = "https://api-staging.pdfmill.com/";

/// PDFMill runs on multiple environments. You'd usually want Production.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Staging environment.
    Staging,

    /// Production environment.
    #[default]
    Production,

    /// Custom environment; providing a base URL is mandatory.
    Custom,
}

/// Credentials and per-client configuration for one tenant.
///
/// The [`Debug`] impl redacts the API secret to prevent accidental
/// credential exposure in log output.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientCredentials {
    /// The API key, unique across registered clients.
    pub api_key: String,

    /// The API secret belonging to the key.
    pub api_secret: SecretString,

    /// Optional display name, unique across registered clients when set.
    #[serde(default)]
    pub name: Option<String>,

    /// Which environment this client talks to.
    #[serde(default)]
    pub environment: Environment,

    /// Base URL for [`Environment::Custom`].
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Enables gzip/deflate response decompression where possible.
    #[serde(default)]
    pub enable_compression: bool,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("name", &self.name)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("enable_compression", &self.enable_compression)
            .finish()
    }
}

impl ClientCredentials {
    /// Create credentials for the default (production) environment.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
            name: None,
            environment: Environment::default(),
            base_url: None,
            enable_compression: false,
        }
    }

    /// Set the client name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the target environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set a custom base URL and switch to [`Environment::Custom`].
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.environment = Environment::Custom;
        self.base_url = Some(base_url);
        self
    }

    /// Enable gzip/deflate response decompression.
    #[must_use]
    pub const fn with_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    /// Resolve the base URL this client talks to.
    ///
    /// A pure function of the environment, plus the stored URL for
    /// [`Environment::Custom`].
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Configuration`] when the Custom environment
    /// has no base URL configured.
    pub fn resolved_base_url(&self) -> ClientResult<Url> {
        match self.environment {
            Environment::Production => Ok(Url::parse(PRODUCTION_BASE_URL)?),
            Environment::Staging => Ok(Url::parse(STAGING_BASE_URL)?),
            Environment::Custom => self.base_url.clone().ok_or_else(|| {
                PdfClientError::configuration(format!(
                    "client '{}' uses the custom environment but has no base URL",
                    self.api_key
                ))
            }),
        }
    }

    /// Check that the key and secret are present.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Configuration`] when either is empty.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_key.is_empty() || self.api_secret.expose_secret().is_empty() {
            return Err(PdfClientError::configuration(
                "no api_key and/or api_secret configured",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_environment_is_production() {
        let credentials = ClientCredentials::new("key-01", "secret-01");
        assert_eq!(credentials.environment, Environment::Production);
        assert_eq!(
            credentials.resolved_base_url().unwrap().as_str(),
            PRODUCTION_BASE_URL
        );
    }

    #[test]
    fn test_staging_base_url() {
        let credentials = ClientCredentials::new("key-01", "secret-01")
            .with_environment(Environment::Staging);
        assert_eq!(
            credentials.resolved_base_url().unwrap().as_str(),
            STAGING_BASE_URL
        );
    }

    #[test]
    fn test_custom_requires_base_url() {
        let credentials = ClientCredentials::new("key-01", "secret-01")
            .with_environment(Environment::Custom);
        assert!(matches!(
            credentials.resolved_base_url(),
            Err(PdfClientError::Configuration(_))
        ));

        let url = Url::parse("https://pdf.example.test/").unwrap();
        let credentials =
            ClientCredentials::new("key-01", "secret-01").with_base_url(url.clone());
        assert_eq!(credentials.environment, Environment::Custom);
        assert_eq!(credentials.resolved_base_url().unwrap(), url);
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        assert!(ClientCredentials::new("", "secret").validate().is_err());
        assert!(ClientCredentials::new("key", "").validate().is_err());
        assert!(ClientCredentials::new("key", "secret").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credentials =
            ClientCredentials::new("key-01", "hunter2").with_name("invoices");
        let output = format!("{credentials:?}");

        assert!(output.contains("key-01"));
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("hunter2"));
    }

    #[test]
    fn test_deserializes_from_config_shape() {
        let credentials: ClientCredentials = serde_json::from_str(
            r#"{
                "api_key": "key-01",
                "api_secret": "secret-01",
                "name": "invoices",
                "environment": "staging",
                "enable_compression": true
            }"#,
        )
        .unwrap();

        assert_eq!(credentials.api_key, "key-01");
        assert_eq!(credentials.name.as_deref(), Some("invoices"));
        assert_eq!(credentials.environment, Environment::Staging);
        assert!(credentials.enable_compression);
    }
}
