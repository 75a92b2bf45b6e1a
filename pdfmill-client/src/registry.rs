//! Validated collection of client credentials.
//!
//! The registry enforces that every entry carries a key and secret and that
//! no two entries share a name or API key. Once built it is immutable;
//! consumers share a snapshot behind an `Arc`.

use crate::credentials::ClientCredentials;
use crate::error::{ClientResult, PdfClientError};

/// Immutable, validated set of registered client credentials.
#[derive(Debug, Clone)]
pub struct CredentialsRegistry {
    entries: Vec<ClientCredentials>,
}

impl CredentialsRegistry {
    /// Validate and build a registry from the given entries.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Configuration`] when the list is empty,
    /// any entry lacks a key or secret, or names/keys are duplicated
    /// (case-insensitive; blank names are ignored).
    pub fn new(entries: Vec<ClientCredentials>) -> ClientResult<Self> {
        if entries.is_empty() {
            return Err(PdfClientError::configuration(
                "no API clients were registered",
            ));
        }

        for entry in &entries {
            entry.validate()?;
        }

        let duplicate_names = duplicates(&entries, |c| c.name.clone());
        if !duplicate_names.is_empty() {
            return Err(PdfClientError::configuration(format!(
                "multiple clients named '{}' were registered; client names must be unique",
                duplicate_names.join(", ")
            )));
        }

        let duplicate_keys = duplicates(&entries, |c| Some(c.api_key.clone()));
        if !duplicate_keys.is_empty() {
            return Err(PdfClientError::configuration(format!(
                "multiple clients with API key '{}' were registered; API keys must be unique",
                duplicate_keys.join(", ")
            )));
        }

        Ok(Self { entries })
    }

    /// Find a client's credentials by name or API key.
    ///
    /// With `None`, succeeds only when exactly one client is registered.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::AmbiguousClient`] when `None` is given and
    /// more than one client is registered, or [`PdfClientError::ClientNotFound`]
    /// when nothing matches.
    pub fn resolve(&self, name_or_api_key: Option<&str>) -> ClientResult<&ClientCredentials> {
        match name_or_api_key {
            None => {
                if self.entries.len() == 1 {
                    Ok(&self.entries[0])
                } else {
                    Err(PdfClientError::AmbiguousClient {
                        count: self.entries.len(),
                    })
                }
            }
            Some(wanted) => self
                .entries
                .iter()
                .find(|c| c.api_key == wanted || c.name.as_deref() == Some(wanted))
                .ok_or_else(|| PdfClientError::ClientNotFound(wanted.to_string())),
        }
    }

    /// All registered credentials, in registration order.
    #[must_use]
    pub fn all(&self) -> &[ClientCredentials] {
        &self.entries
    }

    /// Number of registered clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty. Never true for a built registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates credential entries and produces an immutable registry.
///
/// Re-registration is explicit: [`RegistryBuilder::replace_all`] drops the
/// previously accumulated list instead of appending to it.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<ClientCredentials>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one client's credentials.
    #[must_use]
    pub fn register(mut self, credentials: ClientCredentials) -> Self {
        self.entries.push(credentials);
        self
    }

    /// Replace everything accumulated so far.
    #[must_use]
    pub fn replace_all(mut self, entries: Vec<ClientCredentials>) -> Self {
        self.entries = entries;
        self
    }

    /// Validate the accumulated set and build the registry.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`CredentialsRegistry::new`].
    pub fn build(self) -> ClientResult<CredentialsRegistry> {
        CredentialsRegistry::new(self.entries)
    }
}

/// Values appearing more than once, compared case-insensitively.
/// `None`/blank values never count as duplicates; a collision is reported
/// under the first-seen spelling.
fn duplicates<F>(entries: &[ClientCredentials], key: F) -> Vec<String>
where
    F: Fn(&ClientCredentials) -> Option<String>,
{
    // folded value -> first original spelling
    let mut seen: Vec<(String, String)> = Vec::new();
    let mut duplicated: Vec<String> = Vec::new();

    for entry in entries {
        let Some(value) = key(entry) else { continue };
        if value.trim().is_empty() {
            continue;
        }
        let folded = value.to_uppercase();
        if let Some((_, original)) = seen.iter().find(|(f, _)| *f == folded) {
            if !duplicated.contains(original) {
                duplicated.push(original.clone());
            }
        } else {
            seen.push((folded, value));
        }
    }

    duplicated
}
