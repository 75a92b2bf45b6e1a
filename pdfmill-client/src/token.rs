//! OAuth2 access token with skewed expiry.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Seconds before (-) or after (+) the advertised lifetime at which a token
/// is considered expired. Negative: tokens expire slightly early.
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = -30;

/// OAuth2 token endpoint wire response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: i64,
}

/// A bearer token obtained from the token endpoint.
///
/// The derived expiry applies [`DEFAULT_CLOCK_SKEW_SECONDS`] so the token is
/// treated as expired slightly before the server would reject it. The
/// [`Debug`] impl redacts the token string.
#[derive(Clone)]
pub struct AccessToken {
    token_type: String,
    access_token: String,
    expires_in: i64,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    /// Create a token obtained now, expiring after `expires_in` seconds
    /// adjusted by the default clock skew.
    #[must_use]
    pub fn new(
        token_type: impl Into<String>,
        access_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            token_type: token_type.into(),
            access_token: access_token.into(),
            expires_in,
            expires_at: Self::expiry_from_now(expires_in),
        }
    }

    /// The token type, currently always `bearer`.
    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The bearer token string.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Advertised lifetime in seconds.
    #[must_use]
    pub const fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Replace the advertised lifetime and recompute the derived expiry
    /// from now. The only permitted mutation.
    pub fn set_expires_in(&mut self, expires_in: i64) {
        self.expires_in = expires_in;
        self.expires_at = Self::expiry_from_now(expires_in);
    }

    /// Whether the skew-adjusted expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    fn expiry_from_now(expires_in: i64) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(expires_in + DEFAULT_CLOCK_SKEW_SECONDS)
    }
}
