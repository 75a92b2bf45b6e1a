//! Client factories for the two deployment shapes.
//!
//! [`StandaloneClientFactory`] is for applications without a composition
//! root: register credentials imperatively and receive cached,
//! self-contained clients with a bounded lifetime. [`SharedClientFactory`]
//! is for wired applications: it snapshots a validated registry, shares a
//! [`TokenCache`] across every client it hands out, and can be reconfigured
//! wholesale without losing cached tokens.

use crate::auth::{AuthenticationService, EmbeddedAuthenticator, SharedAuthenticator, TokenCache};
use crate::client::RenderClient;
use crate::credentials::ClientCredentials;
use crate::error::{ClientResult, PdfClientError};
use crate::http::{HttpConfig, build_http_client};
use crate::registry::CredentialsRegistry;
use crate::settings::ClientSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// How long a standalone client is served from cache before being rebuilt.
pub const DEFAULT_CLIENT_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Lifecycle state of a standalone client for a given API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No client has been built for this key yet, or the cached one has
    /// not served a request.
    Fresh,

    /// The cached client is within its lifetime and has served requests.
    Active,

    /// The cached client has outlived its lifetime; the next request
    /// rebuilds it.
    Expired,
}

struct CachedClient {
    client: Arc<RenderClient>,
    created: Instant,
}

/// Factory for self-contained clients, usable without dependency wiring.
///
/// Registration is imperative and append-only; the registry snapshot is
/// built lazily on first use and invalidated by later registrations.
/// Clients are cached per API key and rebuilt after their lifetime passes,
/// which also bounds how long a pooled connection set survives.
pub struct StandaloneClientFactory {
    entries: Mutex<Vec<ClientCredentials>>,
    registry: Mutex<Option<Arc<CredentialsRegistry>>>,
    clients: RwLock<HashMap<String, CachedClient>>,
    lifetime: Duration,
    http_config: HttpConfig,
}

impl Default for StandaloneClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StandaloneClientFactory {
    /// Create an empty factory with the default lifetime and transport
    /// configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            registry: Mutex::new(None),
            clients: RwLock::new(HashMap::new()),
            lifetime: DEFAULT_CLIENT_LIFETIME,
            http_config: HttpConfig::default(),
        }
    }

    /// Override how long cached clients are served before rebuilding.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Override the HTTP transport configuration for built clients.
    #[must_use]
    pub fn with_http_config(mut self, http_config: HttpConfig) -> Self {
        self.http_config = http_config;
        self
    }

    /// Register one client's credentials.
    ///
    /// Cross-entry validation (duplicate names or keys) is deferred to the
    /// first [`StandaloneClientFactory::client`] call, where the registry
    /// snapshot is built.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Configuration`] when the key or secret is
    /// empty.
    pub fn register(&self, credentials: ClientCredentials) -> ClientResult<()> {
        credentials.validate()?;

        debug!(api_key = %credentials.api_key, "registering standalone client");
        self.entries
            .lock()
            .map_err(|_| PdfClientError::configuration("credentials list lock poisoned"))?
            .push(credentials);

        // The snapshot no longer reflects the entry set.
        *self
            .registry
            .lock()
            .map_err(|_| PdfClientError::configuration("registry lock poisoned"))? = None;

        Ok(())
    }

    /// A client for the given name or API key, from cache or freshly built.
    ///
    /// With `None`, succeeds only when exactly one client is registered.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::NotConfigured`] before any registration,
    /// [`PdfClientError::AmbiguousClient`]/[`PdfClientError::ClientNotFound`]
    /// from resolution, or [`PdfClientError::Configuration`] when the
    /// accumulated entries fail cross-validation.
    #[instrument(skip(self))]
    pub fn client(&self, name_or_api_key: Option<&str>) -> ClientResult<Arc<RenderClient>> {
        let registry = self.snapshot()?;
        let credentials = registry.resolve(name_or_api_key)?.clone();

        {
            let clients = self
                .clients
                .read()
                .map_err(|_| PdfClientError::configuration("client cache lock poisoned"))?;
            if let Some(cached) = clients.get(&credentials.api_key) {
                if cached.created.elapsed() < self.lifetime {
                    return Ok(Arc::clone(&cached.client));
                }
            }
        }

        let client = Arc::new(self.build_client(&credentials)?);

        let mut clients = self
            .clients
            .write()
            .map_err(|_| PdfClientError::configuration("client cache lock poisoned"))?;
        clients.insert(
            credentials.api_key.clone(),
            CachedClient {
                client: Arc::clone(&client),
                created: Instant::now(),
            },
        );

        debug!(api_key = %credentials.api_key, "built standalone client");
        Ok(client)
    }

    /// Lifecycle state of the cached client for the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::ClientNotFound`] when no credentials are
    /// registered under the key; an unknown tenant has no state to report.
    pub fn client_state(&self, api_key: &str) -> ClientResult<ClientState> {
        let registered = self
            .entries
            .lock()
            .map_err(|_| PdfClientError::configuration("credentials list lock poisoned"))?
            .iter()
            .any(|c| c.api_key == api_key);
        if !registered {
            return Err(PdfClientError::ClientNotFound(api_key.to_string()));
        }

        let clients = self
            .clients
            .read()
            .map_err(|_| PdfClientError::configuration("client cache lock poisoned"))?;

        Ok(match clients.get(api_key) {
            None => ClientState::Fresh,
            Some(cached) if cached.created.elapsed() >= self.lifetime => ClientState::Expired,
            Some(cached) if cached.client.requests_served() == 0 => ClientState::Fresh,
            Some(_) => ClientState::Active,
        })
    }

    /// The current registry snapshot, building it if invalidated.
    fn snapshot(&self) -> ClientResult<Arc<CredentialsRegistry>> {
        let mut slot = self
            .registry
            .lock()
            .map_err(|_| PdfClientError::configuration("registry lock poisoned"))?;

        if let Some(registry) = slot.as_ref() {
            return Ok(Arc::clone(registry));
        }

        let entries = self
            .entries
            .lock()
            .map_err(|_| PdfClientError::configuration("credentials list lock poisoned"))?
            .clone();

        if entries.is_empty() {
            return Err(PdfClientError::NotConfigured);
        }

        let registry = Arc::new(CredentialsRegistry::new(entries)?);
        *slot = Some(Arc::clone(&registry));
        Ok(registry)
    }

    fn build_client(&self, credentials: &ClientCredentials) -> ClientResult<RenderClient> {
        let config = self
            .http_config
            .clone()
            .with_compression(credentials.enable_compression);
        let http = build_http_client(&config)?;

        let auth = Arc::new(EmbeddedAuthenticator::new(credentials.clone(), http.clone())?);
        RenderClient::new(credentials, http, auth)
    }
}

impl std::fmt::Debug for StandaloneClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandaloneClientFactory")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

struct FactoryState {
    registry: Arc<CredentialsRegistry>,
    service: AuthenticationService,
    transports: HashMap<String, reqwest::Client>,
}

/// Factory for shared-cache clients.
///
/// Built once from a validated registry and a [`TokenCache`]; every client
/// it hands out consults the same cache, so tokens obtained by one instance
/// are visible to all. Reconfiguration swaps the registry and transports
/// wholesale while keeping the cache, so still-valid tokens survive.
pub struct SharedClientFactory {
    cache: TokenCache,
    state: RwLock<FactoryState>,
    http_config: HttpConfig,
}

impl SharedClientFactory {
    /// Create a factory over a validated registry and a token cache.
    ///
    /// # Errors
    ///
    /// Returns [`PdfClientError::Http`] when a per-tenant transport cannot
    /// be built.
    pub fn new(registry: CredentialsRegistry, cache: TokenCache) -> ClientResult<Self> {
        Self::with_http_config(registry, cache, HttpConfig::default())
    }

    /// Like [`SharedClientFactory::new`] with explicit transport settings.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`SharedClientFactory::new`].
    pub fn with_http_config(
        registry: CredentialsRegistry,
        cache: TokenCache,
        http_config: HttpConfig,
    ) -> ClientResult<Self> {
        let state = Self::build_state(registry, &cache, &http_config)?;
        Ok(Self {
            cache,
            state: RwLock::new(state),
            http_config,
        })
    }

    /// Create a factory from deserialized settings.
    ///
    /// # Errors
    ///
    /// Propagates settings extraction and registry validation failures.
    pub fn from_settings(settings: ClientSettings, cache: TokenCache) -> ClientResult<Self> {
        let registry = CredentialsRegistry::new(settings.into_credentials()?)?;
        Self::new(registry, cache)
    }

    /// A client for the given name or API key.
    ///
    /// Clients are cheap to create here: the transport and token cache are
    /// shared, so callers may request one per unit of work.
    ///
    /// # Errors
    ///
    /// Returns resolution failures from the registry.
    #[instrument(skip(self))]
    pub fn client(&self, name_or_api_key: Option<&str>) -> ClientResult<RenderClient> {
        let state = self
            .state
            .read()
            .map_err(|_| PdfClientError::configuration("factory state lock poisoned"))?;

        let credentials = state.registry.resolve(name_or_api_key)?;
        let http = state
            .transports
            .get(&credentials.api_key)
            .cloned()
            .ok_or_else(|| PdfClientError::ClientNotFound(credentials.api_key.clone()))?;

        let auth = Arc::new(SharedAuthenticator::new(
            state.service.clone(),
            credentials.api_key.clone(),
        ));
        RenderClient::new(credentials, http, auth)
    }

    /// Replace the registry and transports from new settings, keeping the
    /// token cache.
    ///
    /// # Errors
    ///
    /// Propagates settings extraction and registry validation failures; on
    /// failure the previous configuration stays in effect.
    pub fn reconfigure(&self, settings: ClientSettings) -> ClientResult<()> {
        let registry = CredentialsRegistry::new(settings.into_credentials()?)?;
        let state = Self::build_state(registry, &self.cache, &self.http_config)?;

        *self
            .state
            .write()
            .map_err(|_| PdfClientError::configuration("factory state lock poisoned"))? = state;

        debug!("shared client factory reconfigured");
        Ok(())
    }

    /// Number of registered clients in the current configuration.
    ///
    /// # Errors
    ///
    /// Only fails when the state lock is poisoned.
    pub fn len(&self) -> ClientResult<usize> {
        Ok(self
            .state
            .read()
            .map_err(|_| PdfClientError::configuration("factory state lock poisoned"))?
            .registry
            .len())
    }

    /// Whether any clients are registered. Never true for a built factory.
    ///
    /// # Errors
    ///
    /// Only fails when the state lock is poisoned.
    pub fn is_empty(&self) -> ClientResult<bool> {
        Ok(self.len()? == 0)
    }

    fn build_state(
        registry: CredentialsRegistry,
        cache: &TokenCache,
        http_config: &HttpConfig,
    ) -> ClientResult<FactoryState> {
        let registry = Arc::new(registry);

        let mut transports = HashMap::new();
        for credentials in registry.all() {
            let config = http_config
                .clone()
                .with_compression(credentials.enable_compression);
            transports.insert(credentials.api_key.clone(), build_http_client(&config)?);
        }

        // Token calls use an uncompressed transport; token bodies are tiny.
        let token_http = build_http_client(http_config)?;
        let service = AuthenticationService::new(cache.clone(), Arc::clone(&registry), token_http);

        Ok(FactoryState {
            registry,
            service,
            transports,
        })
    }
}

impl std::fmt::Debug for SharedClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedClientFactory").finish_non_exhaustive()
    }
}
