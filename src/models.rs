//! Data model shared across the session core.

use serde::{Deserialize, Serialize};

/// The access/refresh token pair owned by the token store.
///
/// A pair is either fully present or fully absent in durable storage;
/// no partial state is observably persisted beyond a single
/// failed-exchange window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Opaque JWT access token.
    pub access_token: String,
    /// Opaque refresh token.
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a pair from both halves.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Successful response from the provider's token endpoint.
///
/// Extra fields (`expires_in`, `token_type`, `id_token`, ...) are
/// ignored; the access token's own `exp` claim is authoritative for
/// expiry.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// The issued access token.
    pub access_token: String,
    /// The issued refresh token.
    pub refresh_token: String,
}

impl From<TokenResponse> for TokenPair {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

/// Error payload from the provider's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenErrorResponse {
    /// OAuth error code, e.g. `invalid_grant`.
    pub error: String,
    /// Human-readable description, when provided.
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Parameters extracted from the redirect callback URL. Consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code to exchange.
    pub code: String,
    /// CSRF state echoed back by the provider.
    pub state: String,
}

/// State of an in-progress login attempt, persisted tab-scoped
/// between login initiation and callback completion (or abandonment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLogin {
    /// PKCE code verifier, sent with the token exchange.
    pub verifier: String,
    /// Expected CSRF `state`, validated against the callback.
    pub state: String,
}
