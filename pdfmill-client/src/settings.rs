//! Configuration-system settings object.
//!
//! Applications typically deserialize this from a `pdfmill` section of
//! their configuration. Either a single flattened credentials record or a
//! `clients` list must be populated, never both.

use crate::credentials::ClientCredentials;
use crate::error::{ClientResult, PdfClientError};
use serde::Deserialize;

/// Conventional configuration section name.
pub const SETTINGS_SECTION: &str = "pdfmill";

/// Settings entry holding one client or a named list of clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientSettings {
    /// A single client's credentials, flattened into the section itself.
    #[serde(flatten)]
    pub default_client: Option<ClientCredentials>,

    /// A list of client credentials.
    #[serde(default)]
    pub clients: Vec<ClientCredentials>,
}

impl ClientSettings {
    /// Settings for a single client.
    #[must_use]
    pub const fn single(credentials: ClientCredentials) -> Self {
        Self {
            default_client: Some(credentials),
            clients: Vec::new(),
        }
    }

    /// Settings for a list of clients.
    #[must_use]
    pub const fn list(clients: Vec<ClientCredentials>) -> Self {
        Self {
            default_client: None,
            clients,
        }
    }

    /// Extract the configured credentials.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Configuration`] when both the single record
    /// and the list are populated, or when neither is.
    pub fn into_credentials(self) -> ClientResult<Vec<ClientCredentials>> {
        match (self.default_client, self.clients.is_empty()) {
            (Some(_), false) => Err(PdfClientError::configuration(
                "configure either a single client or a list of clients, not both",
            )),
            (Some(single), true) => Ok(vec![single]),
            (None, false) => Ok(self.clients),
            (None, true) => Err(PdfClientError::configuration(
                "configure either a single client or a list of clients, not neither",
            )),
        }
    }
}
