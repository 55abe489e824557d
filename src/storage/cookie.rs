//! Cookie-backed token storage with security attributes.
//!
//! Persists the two tokens as cookies with `SameSite=Strict`,
//! `Secure` when the application origin is HTTPS, the access cookie
//! expiring at the token's own `exp` claim and the refresh cookie at
//! a bounded default (refresh tokens are opaque client-side and carry
//! no usable expiry claim).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::instrument;

use super::TokenStore;
use crate::claims::decode_access_claims;
use crate::config::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, REFRESH_TOKEN_TTL};
use crate::error::Result;
use crate::models::TokenPair;

/// A cookie plus the attributes the store sets on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// `SameSite` attribute; always `Strict` for this store.
    pub same_site: &'static str,
    /// Whether the `Secure` attribute is set.
    pub secure: bool,
    /// Absolute expiry as a Unix timestamp, when bounded.
    pub expires_at: Option<i64>,
}

/// The host-environment cookie boundary.
///
/// In a browser embedding this maps onto `document.cookie`; the
/// in-memory implementation backs tests and non-browser hosts.
pub trait CookieJar: Send + Sync {
    /// Set or replace a cookie.
    fn set(&self, cookie: Cookie) -> Result<()>;

    /// Read a cookie value. Expired cookies read as absent.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Remove a cookie. Idempotent.
    fn remove(&self, name: &str) -> Result<()>;
}

/// In-memory [`CookieJar`] honouring expiry on read.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, Cookie>>,
}

impl MemoryCookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect a stored cookie with its attributes, ignoring expiry.
    /// For assertions on attribute policy.
    pub fn raw(&self, name: &str) -> Option<Cookie> {
        self.cookies.lock().unwrap().get(name).cloned()
    }
}

impl CookieJar for MemoryCookieJar {
    fn set(&self, cookie: Cookie) -> Result<()> {
        self.cookies.lock().unwrap().insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        let cookies = self.cookies.lock().unwrap();
        Ok(cookies.get(name).and_then(|c| {
            match c.expires_at {
                Some(exp) if exp <= chrono::Utc::now().timestamp() => None,
                _ => Some(c.value.clone()),
            }
        }))
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.cookies.lock().unwrap().remove(name);
        Ok(())
    }
}

/// [`TokenStore`] writing through a [`CookieJar`] with the security
/// attributes described in the module docs.
pub struct CookieTokenStore {
    jar: Arc<dyn CookieJar>,
    /// `Secure` attribute; true when the application origin is HTTPS.
    secure: bool,
}

impl CookieTokenStore {
    /// Create a store over `jar`. `secure` should be
    /// [`ProviderConfig::is_secure_origin`](crate::config::ProviderConfig::is_secure_origin).
    pub fn new(jar: Arc<dyn CookieJar>, secure: bool) -> Self {
        Self { jar, secure }
    }

    fn cookie(&self, name: &str, value: &str, expires_at: Option<i64>) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            same_site: "Strict",
            secure: self.secure,
            expires_at,
        }
    }
}

#[async_trait]
impl TokenStore for CookieTokenStore {
    #[instrument(skip(self, pair))]
    async fn save(&self, pair: &TokenPair) -> Result<()> {
        // The access cookie expires exactly when the token itself
        // does; a malformed token is never persisted.
        let claims = decode_access_claims(&pair.access_token)?;
        let refresh_expiry = chrono::Utc::now().timestamp() + REFRESH_TOKEN_TTL.as_secs() as i64;

        self.jar
            .set(self.cookie(ACCESS_TOKEN_KEY, &pair.access_token, Some(claims.exp)))?;
        self.jar
            .set(self.cookie(REFRESH_TOKEN_KEY, &pair.refresh_token, Some(refresh_expiry)))?;
        Ok(())
    }

    async fn access_token(&self) -> Result<Option<String>> {
        self.jar.get(ACCESS_TOKEN_KEY)
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.jar.get(REFRESH_TOKEN_KEY)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.jar.remove(ACCESS_TOKEN_KEY)?;
        self.jar.remove(REFRESH_TOKEN_KEY)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "cookie"
    }
}
