//! The auth flow controller, the core session state machine.
//!
//! Orchestrates login initiation, callback handling, token exchange,
//! silent refresh and logout. All failures are converted into state
//! transitions plus a returned error value at this boundary; nothing
//! propagates as a panic to the route guard.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::endpoints;
use crate::browser::Browser;
use crate::claims::{decode_access_claims, AccessClaims};
use crate::config::{ProviderConfig, HOME_PATH};
use crate::error::{Error, Result};
use crate::models::{CallbackParams, PendingLogin};
use crate::pkce::{generate_state, PkcePair};
use crate::session::Session;
use crate::storage::{MemoryTokenStore, MemoryVerifierStore, TokenStore, VerifierStore};

/// Observable state of the auth flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// No valid session.
    Unauthenticated,
    /// Verifier stored, awaiting the provider redirect.
    LoggingIn,
    /// Exchanging the callback code for tokens.
    ExchangingCode,
    /// Valid session established.
    Authenticated,
    /// Refreshing an expired access token.
    Refreshing,
}

/// The auth flow controller.
///
/// Owns the [`Session`] mutation rights; the route guard and UI only
/// ever read the session. Construct via [`AuthFlow::builder`].
pub struct AuthFlow {
    config: ProviderConfig,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
    pending: Arc<dyn VerifierStore>,
    browser: Arc<dyn Browser>,
    session: Session,
    state: RwLock<FlowState>,
    /// Single-slot guard coalescing concurrent refresh attempts.
    refresh_gate: Mutex<()>,
}

impl AuthFlow {
    /// Create a builder for configuring the flow.
    pub fn builder() -> AuthFlowBuilder {
        AuthFlowBuilder::new()
    }

    /// The session handle observed by the guard and UI.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Snapshot of the current flow state.
    pub fn state(&self) -> FlowState {
        *self.state.read().unwrap()
    }

    /// The provider configuration in use.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn browser(&self) -> &dyn Browser {
        self.browser.as_ref()
    }

    fn set_state(&self, state: FlowState) {
        *self.state.write().unwrap() = state;
    }

    /// Username from decoded claims; a token without an identity is
    /// treated the same as an undecodable one.
    fn username_from(claims: &AccessClaims) -> Result<String> {
        claims
            .preferred_username
            .clone()
            .ok_or_else(|| Error::TokenDecodeError("missing preferred_username claim".into()))
    }

    /// Clear every trace of local session state.
    async fn clear_local_state(&self) -> Result<()> {
        self.session.clear();
        self.tokens.clear().await?;
        self.set_state(FlowState::Unauthenticated);
        Ok(())
    }

    /// Initialize the session from stored tokens.
    ///
    /// Idempotent: a no-op when the session is already authenticated.
    /// An expired access token with a refresh token present triggers
    /// a refresh; without one, the stale token is cleared with zero
    /// network calls. A malformed token clears both tokens and
    /// reports [`Error::TokenDecodeError`] while the session degrades
    /// to unauthenticated.
    #[instrument(skip(self))]
    pub async fn init(&self) -> Result<()> {
        if self.session.is_authenticated() {
            return Ok(());
        }

        let Some(access) = self.tokens.access_token().await? else {
            self.set_state(FlowState::Unauthenticated);
            return Ok(());
        };

        let claims = match decode_access_claims(&access) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "stored access token is malformed, clearing session state");
                self.clear_local_state().await?;
                return Err(e);
            }
        };

        if claims.is_expired() {
            return match self.tokens.refresh_token().await? {
                Some(refresh) => {
                    debug!("access token expired, refreshing");
                    self.refresh(&refresh).await
                }
                None => {
                    debug!("access token expired with no refresh token, clearing");
                    self.tokens.clear().await?;
                    self.set_state(FlowState::Unauthenticated);
                    Ok(())
                }
            };
        }

        let username = match Self::username_from(&claims) {
            Ok(username) => username,
            Err(e) => {
                warn!(error = %e, "stored access token carries no identity, clearing");
                self.clear_local_state().await?;
                return Err(e);
            }
        };

        self.session.set(username);
        self.set_state(FlowState::Authenticated);
        Ok(())
    }

    /// Begin a login attempt: generate PKCE material and a CSRF
    /// state, persist them tab-scoped, and leave the page for the
    /// provider's authorization endpoint.
    ///
    /// Under normal success this does not return control to the
    /// caller; the navigation leaves the page.
    #[instrument(skip(self))]
    pub async fn redirect_to_login(&self) -> Result<()> {
        let pkce = PkcePair::generate()?;
        let state = generate_state()?;

        self.pending
            .save_pending(&PendingLogin {
                verifier: pkce.verifier,
                state: state.clone(),
            })
            .await?;

        let url = self.config.authorization_url(&pkce.challenge, &state)?;
        self.set_state(FlowState::LoggingIn);
        info!("redirecting to authorization endpoint");
        self.browser.redirect(&url);
        Ok(())
    }

    /// Complete a login attempt from the redirect callback.
    ///
    /// Reads `code` and `state` from the current URL and the pending
    /// login from tab storage, validates the CSRF state, exchanges
    /// the code, persists the pair, establishes the session, and
    /// navigates home exactly once.
    #[instrument(skip(self))]
    pub async fn parse_login_callback(&self) -> Result<()> {
        let Some(pending) = self.pending.load_pending().await? else {
            // Nothing to correlate against; leave everything as-is.
            return Err(Error::CallbackMissingParams("code_verifier"));
        };

        let params = match (
            self.browser.query_param("code"),
            self.browser.query_param("state"),
        ) {
            (Some(code), Some(state)) => CallbackParams { code, state },
            (None, _) => {
                // Abandoned attempt: the verifier is single-use.
                self.pending.clear_pending().await?;
                return Err(Error::CallbackMissingParams("code"));
            }
            (_, None) => {
                self.pending.clear_pending().await?;
                return Err(Error::CallbackMissingParams("state"));
            }
        };

        if params.state != pending.state {
            warn!("callback state does not match stored state, rejecting code");
            self.pending.clear_pending().await?;
            return Err(Error::StateMismatch);
        }

        self.set_state(FlowState::ExchangingCode);

        let pair =
            match endpoints::exchange_code(&self.http, &self.config, &params.code, &pending.verifier)
                .await
            {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, "token exchange failed");
                    self.pending.clear_pending().await?;
                    self.set_state(FlowState::Unauthenticated);
                    return Err(e);
                }
            };

        // Decode before persisting: a pair the core cannot interpret
        // is never stored.
        let claims = match decode_access_claims(&pair.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "exchanged access token is malformed, discarding");
                self.pending.clear_pending().await?;
                self.set_state(FlowState::Unauthenticated);
                return Err(e);
            }
        };
        let username = match Self::username_from(&claims) {
            Ok(username) => username,
            Err(e) => {
                self.pending.clear_pending().await?;
                self.set_state(FlowState::Unauthenticated);
                return Err(e);
            }
        };

        self.tokens.save(&pair).await?;
        self.session.set(username);
        self.pending.clear_pending().await?;
        self.set_state(FlowState::Authenticated);
        info!("login completed");
        self.browser.navigate(HOME_PATH);
        Ok(())
    }

    /// Refresh the session with a refresh token.
    ///
    /// Concurrent calls racing on the same stale token are coalesced:
    /// late callers wait on the single-slot gate, re-check the stored
    /// token, and adopt the first caller's result instead of issuing
    /// a duplicate request. A failed refresh is a full logout (both
    /// tokens cleared, session cleared, navigation home), never a
    /// retry.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<()> {
        let _slot = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(access) = self.tokens.access_token().await? {
            if let Ok(claims) = decode_access_claims(&access) {
                if !claims.is_expired() {
                    debug!("token already refreshed by a concurrent caller");
                    self.session.set(Self::username_from(&claims)?);
                    self.set_state(FlowState::Authenticated);
                    return Ok(());
                }
            }
        }

        self.set_state(FlowState::Refreshing);

        let pair = match endpoints::refresh_token(&self.http, &self.config, refresh_token).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "refresh failed, forcing logout");
                self.clear_local_state().await?;
                self.browser.navigate(HOME_PATH);
                return Err(e);
            }
        };

        let claims = match decode_access_claims(&pair.access_token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "refreshed access token is malformed, forcing logout");
                self.clear_local_state().await?;
                self.browser.navigate(HOME_PATH);
                return Err(e);
            }
        };
        let username = Self::username_from(&claims)?;

        self.tokens.save(&pair).await?;
        self.session.set(username);
        self.set_state(FlowState::Authenticated);
        info!("session refreshed");
        Ok(())
    }

    /// End the session locally and at the provider.
    ///
    /// Clears the session, both tokens and any pending login, then
    /// leaves the page for the provider's logout endpoint. A missing
    /// refresh token is not an error; the logout URL simply omits it.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let refresh = self.tokens.refresh_token().await?;

        self.session.clear();
        self.tokens.clear().await?;
        self.pending.clear_pending().await?;
        self.set_state(FlowState::Unauthenticated);

        let url = self.config.logout_url(refresh.as_deref())?;
        info!("redirecting to provider logout");
        self.browser.redirect(&url);
        Ok(())
    }

    /// Fetch the provider's userinfo claims for an access token.
    ///
    /// HTTP failures surface to the caller untouched; no retry, no
    /// caching.
    pub async fn user_info(&self, access_token: &str) -> Result<serde_json::Value> {
        endpoints::fetch_userinfo(&self.http, &self.config, access_token).await
    }
}

impl std::fmt::Debug for AuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlow")
            .field("state", &self.state())
            .field("token_store", &self.tokens.name())
            .field("verifier_store", &self.pending.name())
            .finish()
    }
}

/// Builder for [`AuthFlow`].
pub struct AuthFlowBuilder {
    config: Option<ProviderConfig>,
    tokens: Option<Arc<dyn TokenStore>>,
    pending: Option<Arc<dyn VerifierStore>>,
    browser: Option<Arc<dyn Browser>>,
    http: Option<reqwest::Client>,
}

impl AuthFlowBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            tokens: None,
            pending: None,
            browser: None,
            http: None,
        }
    }

    /// Set the provider configuration. Required.
    pub fn config(mut self, config: ProviderConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the durable token store. Defaults to an in-memory store.
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    /// Set the ephemeral verifier store. Defaults to an in-memory
    /// store.
    pub fn verifier_store(mut self, store: Arc<dyn VerifierStore>) -> Self {
        self.pending = Some(store);
        self
    }

    /// Set the browser seam. Required.
    pub fn browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Set a custom HTTP client (testing, custom TLS config).
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http = Some(client);
        self
    }

    /// Build the flow.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the provider configuration or
    /// the browser seam is missing.
    pub fn build(self) -> Result<AuthFlow> {
        let config = self
            .config
            .ok_or_else(|| Error::config("provider configuration is required"))?;
        let browser = self
            .browser
            .ok_or_else(|| Error::config("a browser implementation is required"))?;

        Ok(AuthFlow {
            config,
            http: self.http.unwrap_or_default(),
            tokens: self
                .tokens
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            pending: self
                .pending
                .unwrap_or_else(|| Arc::new(MemoryVerifierStore::new())),
            browser,
            session: Session::new(),
            state: RwLock::new(FlowState::Unauthenticated),
            refresh_gate: Mutex::new(()),
        })
    }
}

impl Default for AuthFlowBuilder {
    fn default() -> Self {
        Self::new()
    }
}
