//! Token acquisition, caching, and the per-client authentication seam.
//!
//! Two deployment shapes share one contract: the shared-cache
//! [`AuthenticationService`] hands tokens from a process-wide
//! [`TokenCache`], while the [`EmbeddedAuthenticator`] keeps a single token
//! slot per client instance. Both re-fetch lazily when the cached token has
//! expired; concurrent callers may both fetch and the last write wins.

use crate::credentials::ClientCredentials;
use crate::error::{ClientResult, PdfClientError};
use crate::registry::CredentialsRegistry;
use crate::token::{AccessToken, DEFAULT_CLOCK_SKEW_SECONDS, TokenResponse};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

/// Token endpoint path, relative to a client's base URL.
pub const OAUTH2_TOKEN_PATH: &str = "oauth2/token";

/// Supplies bearer tokens for outgoing requests.
///
/// Each client variant injects its own implementation rather than sharing a
/// mutable base: [`SharedAuthenticator`] consults the process-wide cache,
/// [`EmbeddedAuthenticator`] owns its token outright.
#[async_trait]
pub trait Authenticate: Send + Sync {
    /// A cached token when one is valid, otherwise a freshly fetched one.
    async fn bearer_token(&self) -> ClientResult<String>;

    /// Discard any cached token and fetch a fresh one. Used after a 401.
    async fn refresh_token(&self) -> ClientResult<String>;
}

/// Perform the OAuth2 client-credentials grant against `{base}oauth2/token`.
///
/// # Errors
///
/// Returns [`PdfClientError::Authentication`] when the endpoint does not
/// answer with success, the body is not parseable, the token is missing or
/// empty, or the token is already expired under the skew computation.
pub(crate) async fn fetch_token(
    http: &reqwest::Client,
    base_url: &Url,
    api_key: &str,
    api_secret: &SecretString,
) -> ClientResult<AccessToken> {
    let url = base_url.join(OAUTH2_TOKEN_PATH)?;

    debug!(client_id = api_key, %url, "requesting access token");

    let form = [
        ("client_id", api_key),
        ("client_secret", api_secret.expose_secret()),
        ("grant_type", "client_credentials"),
    ];

    let response = http
        .post(url)
        .form(&form)
        .send()
        .await
        .map_err(|e| PdfClientError::authentication_caused_by("token request failed", e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PdfClientError::authentication_caused_by("token response unreadable", e))?;

    if !status.is_success() {
        return Err(PdfClientError::authentication(format!(
            "token endpoint returned {status} for client_id '{api_key}': {body}"
        )));
    }

    let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        PdfClientError::authentication_caused_by(
            format!("could not parse token JSON for client_id '{api_key}': {body}"),
            e,
        )
    })?;

    let access_token = match parsed.access_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            return Err(PdfClientError::authentication(format!(
                "could not obtain token for client_id '{api_key}', JSON: {body}"
            )));
        }
    };

    let token = AccessToken::new(
        parsed.token_type.unwrap_or_default(),
        access_token,
        parsed.expires_in,
    );

    // Guards against clock skew or a misbehaving server.
    if token.is_expired() {
        warn!(client_id = api_key, expires_in = parsed.expires_in, "token came in expired");
        return Err(PdfClientError::authentication(format!(
            "token for client_id '{api_key}' came in expired: expires_in {}s, skew {}s",
            parsed.expires_in, DEFAULT_CLOCK_SKEW_SECONDS
        )));
    }

    Ok(token)
}

/// Process-wide token cache keyed by API key.
///
/// An explicit, constructible object with a defined lifetime: create one at
/// application wiring time and hand it to every authenticator that should
/// share it. Replacement is atomic per key; in-flight fetches are not
/// deduplicated and the last writer wins.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<HashMap<String, AccessToken>>>,
}

impl TokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token for the given API key, expired or not.
    pub async fn get(&self, api_key: &str) -> Option<AccessToken> {
        self.inner.read().await.get(api_key).cloned()
    }

    /// Store a token, replacing any existing entry for the key.
    pub async fn insert(&self, api_key: impl Into<String>, token: AccessToken) {
        self.inner.write().await.insert(api_key.into(), token);
    }

    /// Drop the entry for the given API key.
    pub async fn invalidate(&self, api_key: &str) {
        self.inner.write().await.remove(api_key);
    }

    /// Number of cached tokens.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the cache holds no tokens.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// Shared-cache token service.
///
/// Resolves a tenant's credentials through the registry and keeps obtained
/// tokens in a [`TokenCache`] shared across all client instances for the
/// same tenant.
#[derive(Debug, Clone)]
pub struct AuthenticationService {
    cache: TokenCache,
    registry: Arc<CredentialsRegistry>,
    http: reqwest::Client,
}

impl AuthenticationService {
    /// Create a service over the given cache, registry snapshot, and
    /// transport for token calls.
    #[must_use]
    pub fn new(cache: TokenCache, registry: Arc<CredentialsRegistry>, http: reqwest::Client) -> Self {
        Self {
            cache,
            registry,
            http,
        }
    }

    /// A valid token for the given API key, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Fails with [`PdfClientError::ClientNotFound`] for unknown keys and
    /// [`PdfClientError::Authentication`] for token endpoint problems.
    #[instrument(skip(self))]
    pub async fn token(&self, api_key: &str) -> ClientResult<AccessToken> {
        if let Some(cached) = self.cache.get(api_key).await {
            if !cached.is_expired() {
                return Ok(cached);
            }
            debug!(api_key, "cached token expired");
        }

        self.fetch_and_store(api_key).await
    }

    /// Fetch a fresh token, bypassing the cache. Used after a 401.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AuthenticationService::token`].
    #[instrument(skip(self))]
    pub async fn refresh(&self, api_key: &str) -> ClientResult<AccessToken> {
        self.fetch_and_store(api_key).await
    }

    async fn fetch_and_store(&self, api_key: &str) -> ClientResult<AccessToken> {
        let credentials = self.registry.resolve(Some(api_key))?;
        let base_url = credentials.resolved_base_url()?;

        let token = fetch_token(
            &self.http,
            &base_url,
            &credentials.api_key,
            &credentials.api_secret,
        )
        .await?;

        self.cache.insert(api_key, token.clone()).await;
        debug!(api_key, expires_in = token.expires_in(), "stored fresh token");

        Ok(token)
    }
}

/// Authentication strategy for shared-cache clients.
#[derive(Debug, Clone)]
pub struct SharedAuthenticator {
    service: AuthenticationService,
    api_key: String,
}

impl SharedAuthenticator {
    /// Bind a service to one tenant's API key.
    #[must_use]
    pub fn new(service: AuthenticationService, api_key: impl Into<String>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl Authenticate for SharedAuthenticator {
    async fn bearer_token(&self) -> ClientResult<String> {
        let token = self.service.token(&self.api_key).await?;
        Ok(token.access_token().to_owned())
    }

    async fn refresh_token(&self) -> ClientResult<String> {
        let token = self.service.refresh(&self.api_key).await?;
        Ok(token.access_token().to_owned())
    }
}

/// Authentication strategy for self-contained clients.
///
/// Holds its own single token slot; no cross-client sharing. The token is
/// checked and refreshed lazily right before each send.
pub struct EmbeddedAuthenticator {
    credentials: ClientCredentials,
    base_url: Url,
    http: reqwest::Client,
    slot: RwLock<Option<AccessToken>>,
}

impl EmbeddedAuthenticator {
    /// Create an authenticator owning the given credentials.
    ///
    /// # Errors
    ///
    /// Fails with [`PdfClientError::Configuration`] when the credentials
    /// cannot resolve a base URL.
    pub fn new(credentials: ClientCredentials, http: reqwest::Client) -> ClientResult<Self> {
        let base_url = credentials.resolved_base_url()?;
        Ok(Self {
            credentials,
            base_url,
            http,
            slot: RwLock::new(None),
        })
    }

    async fn fetch_into_slot(&self) -> ClientResult<String> {
        let token = fetch_token(
            &self.http,
            &self.base_url,
            &self.credentials.api_key,
            &self.credentials.api_secret,
        )
        .await?;

        let bearer = token.access_token().to_owned();
        *self.slot.write().await = Some(token);
        Ok(bearer)
    }
}

impl std::fmt::Debug for EmbeddedAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedAuthenticator")
            .field("api_key", &self.credentials.api_key)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Authenticate for EmbeddedAuthenticator {
    async fn bearer_token(&self) -> ClientResult<String> {
        {
            let slot = self.slot.read().await;
            if let Some(token) = slot.as_ref() {
                if !token.is_expired() {
                    return Ok(token.access_token().to_owned());
                }
            }
        }

        self.fetch_into_slot().await
    }

    async fn refresh_token(&self) -> ClientResult<String> {
        self.fetch_into_slot().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_replaces_wholesale() {
        let cache = TokenCache::new();
        cache.insert("key-01", AccessToken::new("typ", "tok-1", 3600)).await;
        cache.insert("key-01", AccessToken::new("typ", "tok-2", 3600)).await;

        assert_eq!(cache.len().await, 1);
        let token = cache.get("key-01").await.unwrap();
        assert_eq!(token.access_token(), "tok-2");
    }

    #[tokio::test]
    async fn test_cache_invalidate() {
        let cache = TokenCache::new();
        cache.insert("key-01", AccessToken::new("typ", "tok", 3600)).await;
        cache.invalidate("key-01").await;

        assert!(cache.is_empty().await);
        assert!(cache.get("key-01").await.is_none());
    }

    #[tokio::test]
    async fn test_caches_are_independent() {
        let first = TokenCache::new();
        let second = TokenCache::new();
        first.insert("key-01", AccessToken::new("typ", "tok", 3600)).await;

        assert!(second.get("key-01").await.is_none());
    }
}
