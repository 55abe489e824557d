//! Storage boundaries for tokens and the pending login attempt.
//!
//! Two seams, matching the two kinds of client storage the flow
//! needs:
//!
//! - [`TokenStore`]: durable storage for the access/refresh token
//!   pair, surviving page reloads. The cookie-backed implementation
//!   is [`CookieTokenStore`]; [`MemoryTokenStore`] backs tests.
//! - [`VerifierStore`]: ephemeral, tab-scoped storage for the
//!   in-progress login attempt (PKCE verifier + CSRF state), cleared
//!   on every completed or abandoned attempt.
//!
//! These are the only components touching the storage boundary;
//! callers never bypass them.

mod cookie;
mod memory;

use async_trait::async_trait;

pub use cookie::{Cookie, CookieJar, CookieTokenStore, MemoryCookieJar};
pub use memory::{MemoryTokenStore, MemoryVerifierStore};

use crate::error::Result;
use crate::models::{PendingLogin, TokenPair};

/// Durable storage for the token pair.
///
/// The pair is persisted as two entries (mirroring the two cookies),
/// so the halves are individually readable: the flow controller needs
/// to observe an expired access token with no refresh token present
/// and clean it up.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist both tokens, overwriting any previous pair.
    async fn save(&self, pair: &TokenPair) -> Result<()>;

    /// Read the stored access token, if any.
    async fn access_token(&self) -> Result<Option<String>>;

    /// Read the stored refresh token, if any.
    async fn refresh_token(&self) -> Result<Option<String>>;

    /// Load the full pair; absent when either half is missing.
    async fn load(&self) -> Result<Option<TokenPair>> {
        match (self.access_token().await?, self.refresh_token().await?) {
            (Some(access), Some(refresh)) => Ok(Some(TokenPair::new(access, refresh))),
            _ => Ok(None),
        }
    }

    /// Remove both tokens unconditionally. Idempotent; a no-op when
    /// nothing is stored.
    async fn clear(&self) -> Result<()>;

    /// Name of this storage backend, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: TokenStore + ?Sized> TokenStore for std::sync::Arc<T> {
    async fn save(&self, pair: &TokenPair) -> Result<()> {
        (**self).save(pair).await
    }
    async fn access_token(&self) -> Result<Option<String>> {
        (**self).access_token().await
    }
    async fn refresh_token(&self) -> Result<Option<String>> {
        (**self).refresh_token().await
    }
    async fn load(&self) -> Result<Option<TokenPair>> {
        (**self).load().await
    }
    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Ephemeral, tab-scoped storage for the in-progress login attempt.
#[async_trait]
pub trait VerifierStore: Send + Sync {
    /// Persist the pending login, replacing any previous attempt.
    async fn save_pending(&self, pending: &PendingLogin) -> Result<()>;

    /// Read the pending login without clearing it.
    async fn load_pending(&self) -> Result<Option<PendingLogin>>;

    /// Remove the pending login. Idempotent.
    async fn clear_pending(&self) -> Result<()>;

    /// Name of this storage backend, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: VerifierStore + ?Sized> VerifierStore for std::sync::Arc<T> {
    async fn save_pending(&self, pending: &PendingLogin) -> Result<()> {
        (**self).save_pending(pending).await
    }
    async fn load_pending(&self) -> Result<Option<PendingLogin>> {
        (**self).load_pending().await
    }
    async fn clear_pending(&self) -> Result<()> {
        (**self).clear_pending().await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
