//! Advisory (unverified) JWT payload decoding.
//!
//! The access token's payload is decoded for its claims only. This is
//! *not* signature verification: claims read here drive UX and
//! state-machine transitions, never authorization decisions; the
//! real authorization boundary is the backend validating the token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Claims the session core reads from an access token payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Unix timestamp when the token expires.
    pub exp: i64,
    /// Username asserted by the provider.
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl AccessClaims {
    /// Whether the token has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Whether the token has expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

/// Decode the claims from a JWT's second dot-segment.
///
/// # Errors
///
/// Returns [`Error::TokenDecodeError`] for any malformed token: wrong
/// segment count, invalid base64url, invalid JSON, or a payload
/// missing the `exp` claim.
pub fn decode_access_claims(token: &str) -> Result<AccessClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::TokenDecodeError("token has no payload segment".into()))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::TokenDecodeError(format!("invalid payload base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::TokenDecodeError(format!("invalid payload JSON: {e}")))
}
