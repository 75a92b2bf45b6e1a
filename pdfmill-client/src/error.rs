//! Client error types using thiserror 2.0.
//!
//! Configuration and authentication problems surface as errors; rendering
//! outcomes are reported through [`crate::result::RenderResult`] instead.

use thiserror::Error;

/// Errors raised by client configuration, resolution, and authentication.
#[derive(Error, Debug)]
pub enum PdfClientError {
    /// Invalid, missing, or duplicate credentials
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// More than one client registered and none was named
    #[error(
        "{count} clients are registered; specify which client to use by name or API key, or register exactly one"
    )]
    AmbiguousClient {
        /// Number of registered clients at resolution time
        count: usize,
    },

    /// No registered client matched the given name or API key
    #[error("No client found by name or API key '{0}'")]
    ClientNotFound(String),

    /// A client was requested before any were registered
    #[error("No clients are registered; register a client before requesting one")]
    NotConfigured,

    /// Token endpoint failure or an unusable token
    #[error("Authentication failed: {message}")]
    Authentication {
        /// What went wrong while obtaining a token
        message: String,
        /// Original cause, when one exists
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A request URL could not be formed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The caller cancelled an in-flight request
    #[error("Request cancelled")]
    Cancelled,
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, PdfClientError>;

impl PdfClientError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an authentication error without an underlying cause.
    #[must_use]
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication {
            message: msg.into(),
            source: None,
        }
    }

    /// Create an authentication error carrying its original cause.
    #[must_use]
    pub fn authentication_caused_by(
        msg: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Authentication {
            message: msg.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Check if this error came from the authentication path.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Short variant name, used in diagnostic status messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "Configuration",
            Self::AmbiguousClient { .. } => "AmbiguousClient",
            Self::ClientNotFound(_) => "ClientNotFound",
            Self::NotConfigured => "NotConfigured",
            Self::Authentication { .. } => "Authentication",
            Self::Http(_) => "Http",
            Self::Serialization(_) => "Serialization",
            Self::InvalidUrl(_) => "InvalidUrl",
            Self::Cancelled => "Cancelled",
        }
    }
}
