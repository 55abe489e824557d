//! Error types for the session core.
//!
//! Every controller operation converts internal failures into a state
//! transition plus one of these error values; nothing in this crate
//! panics past the [`AuthFlow`](crate::auth::AuthFlow) boundary.

use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the session core.
#[derive(Debug, Error)]
pub enum Error {
    /// The entropy source or digest primitive is unavailable.
    ///
    /// Fatal for login initiation: callers must not proceed with a
    /// login attempt when this is returned.
    #[error("crypto primitives unavailable: {0}")]
    CryptoUnavailable(String),

    /// The redirect callback is missing a required parameter
    /// (authorization code or stored verifier). Recoverable; the
    /// route fallback decides the UX.
    #[error("login callback missing parameter: {0}")]
    CallbackMissingParams(&'static str),

    /// The `state` returned by the provider does not match the one
    /// stored at login initiation. CSRF protection for the callback.
    #[error("OAuth state parameter mismatch")]
    StateMismatch,

    /// The token endpoint rejected the authorization-code exchange.
    /// The token store is left untouched.
    #[error("token exchange failed with status {status}: {body}")]
    TokenExchangeFailed {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Provider error payload, verbatim.
        body: String,
    },

    /// A stored or freshly issued access token could not be decoded.
    /// Triggers a full local cleanup of the corrupted state.
    #[error("failed to decode access token: {0}")]
    TokenDecodeError(String),

    /// A refresh attempt failed; treated as session expiry and
    /// converted into a full logout.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The userinfo endpoint returned a non-success status.
    #[error("userinfo request failed with status {status}: {body}")]
    UserInfoFailed {
        /// HTTP status returned by the userinfo endpoint.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A storage backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True when this error forces the user back to an
    /// unauthenticated session (as opposed to aborting a single
    /// operation).
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::TokenDecodeError(_) | Self::RefreshFailed(_))
    }
}
