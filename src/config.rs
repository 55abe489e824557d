//! Provider configuration and endpoint URL construction.

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Scope requested at the authorization endpoint.
pub const SCOPE: &str = "openid profile email";

/// Path of the route hosting the login callback.
pub const CALLBACK_PATH: &str = "/redirect";

/// Path navigated to after a completed login or forced logout.
pub const HOME_PATH: &str = "/";

/// Durable storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Durable storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Ephemeral per-tab storage key for the pending login attempt.
pub const CODE_VERIFIER_KEY: &str = "code_verifier";

/// Bounded lifetime for the refresh token cookie. Refresh tokens are
/// opaque client-side and carry no usable expiry claim.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Environment variable holding the provider base URL.
pub const ENV_PROVIDER_URL: &str = "KEYCLOAK_GATE_PROVIDER_URL";

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "KEYCLOAK_GATE_CLIENT_ID";

/// Environment variable holding the application origin.
pub const ENV_ORIGIN: &str = "KEYCLOAK_GATE_ORIGIN";

/// Identity provider configuration.
///
/// Two external values drive the whole flow: the provider base URL
/// (e.g. `https://idp.example.com/realms/main/protocol/openid-connect`)
/// and the registered client identifier. The application origin is
/// needed to build the redirect URI, which must exactly match the
/// provider's registered callback.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider base URL, no trailing slash.
    base_url: String,
    /// OAuth client identifier.
    client_id: String,
    /// Application origin, e.g. `https://app.example.com`.
    origin: String,
}

impl ProviderConfig {
    /// Create a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the base URL or origin is not a
    /// valid absolute URL, or the client id is empty.
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        origin: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client_id = client_id.into();
        let origin = origin.into().trim_end_matches('/').to_string();

        Url::parse(&base_url)
            .map_err(|e| Error::config(format!("invalid provider base URL '{base_url}': {e}")))?;
        Url::parse(&origin)
            .map_err(|e| Error::config(format!("invalid origin '{origin}': {e}")))?;
        if client_id.is_empty() {
            return Err(Error::config("client_id must not be empty"));
        }

        Ok(Self {
            base_url,
            client_id,
            origin,
        })
    }

    /// Load the configuration from environment variables.
    ///
    /// Reads [`ENV_PROVIDER_URL`], [`ENV_CLIENT_ID`] and
    /// [`ENV_ORIGIN`].
    pub fn from_env() -> Result<Self> {
        let read = |key: &str| {
            std::env::var(key).map_err(|_| Error::config(format!("{key} is not set")))
        };
        Self::new(read(ENV_PROVIDER_URL)?, read(ENV_CLIENT_ID)?, read(ENV_ORIGIN)?)
    }

    /// OAuth client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Application origin.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether the application origin is HTTPS. Drives the `Secure`
    /// cookie attribute.
    pub fn is_secure_origin(&self) -> bool {
        self.origin.starts_with("https://")
    }

    /// Redirect URI hosting the login callback. Must match the
    /// provider's registered callback exactly, at both the
    /// authorization and exchange steps.
    pub fn redirect_uri(&self) -> String {
        format!("{}{}", self.origin, CALLBACK_PATH)
    }

    /// Token endpoint (`POST`, form-encoded).
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.base_url)
    }

    /// Userinfo endpoint (`GET`, bearer auth).
    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/userinfo", self.base_url)
    }

    /// Build the browser-navigated authorization URL for a login
    /// attempt.
    pub fn authorization_url(&self, code_challenge: &str, state: &str) -> Result<String> {
        let mut url = Url::parse(&format!("{}/auth", self.base_url))
            .map_err(|e| Error::config(format!("invalid authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPE)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", state);
        Ok(url.into())
    }

    /// Build the browser-navigated logout URL. The refresh token is
    /// included only when present so the provider can invalidate the
    /// session server-side; its absence is not an error.
    pub fn logout_url(&self, refresh_token: Option<&str>) -> Result<String> {
        let mut url = Url::parse(&format!("{}/logout", self.base_url))
            .map_err(|e| Error::config(format!("invalid logout endpoint: {e}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(token) = refresh_token {
                pairs.append_pair("refresh_token", token);
            }
            pairs.append_pair("client_id", &self.client_id);
        }
        Ok(url.into())
    }
}
