//! In-memory storage backends, primarily for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TokenStore, VerifierStore};
use crate::error::Result;
use crate::models::{PendingLogin, TokenPair};

#[derive(Debug, Default)]
struct Halves {
    access: Option<String>,
    refresh: Option<String>,
}

/// In-memory [`TokenStore`].
///
/// Tracks the two tokens as separate entries like the cookie store
/// does, so tests can seed partial state (an access token with no
/// refresh token).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Halves>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a full pair.
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Halves {
                access: Some(pair.access_token),
                refresh: Some(pair.refresh_token),
            }),
        }
    }

    /// Seed only the access half. Test helper for partial-state
    /// scenarios.
    pub async fn seed_access_only(&self, access_token: impl Into<String>) {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(access_token.into());
        tokens.refresh = None;
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, pair: &TokenPair) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.access = Some(pair.access_token.clone());
        tokens.refresh = Some(pair.refresh_token.clone());
        Ok(())
    }

    async fn access_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().await.access.clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.read().await.refresh.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut tokens = self.tokens.write().await;
        tokens.access = None;
        tokens.refresh = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// In-memory [`VerifierStore`], standing in for per-tab session
/// storage.
#[derive(Debug, Default)]
pub struct MemoryVerifierStore {
    pending: RwLock<Option<PendingLogin>>,
}

impl MemoryVerifierStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerifierStore for MemoryVerifierStore {
    async fn save_pending(&self, pending: &PendingLogin) -> Result<()> {
        *self.pending.write().await = Some(pending.clone());
        Ok(())
    }

    async fn load_pending(&self) -> Result<Option<PendingLogin>> {
        Ok(self.pending.read().await.clone())
    }

    async fn clear_pending(&self) -> Result<()> {
        *self.pending.write().await = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
