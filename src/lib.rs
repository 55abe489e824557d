//! # keycloak-gate
//!
//! Client-side OAuth2 Authorization Code + PKCE session core for
//! OpenID-Connect providers.
//!
//! The crate implements the complete browser-style login lifecycle:
//! PKCE generation, redirect to the provider's authorization
//! endpoint, callback code exchange with CSRF `state` validation,
//! token persistence with security attributes, silent refresh of
//! expired access tokens, and provider-side logout. Host integration
//! happens through two seams: a [`Browser`] for navigation and URL
//! access, and a [`TokenStore`]/[`VerifierStore`] pair for
//! persistence.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use keycloak_gate::{AuthFlow, ProviderConfig, RouteGuard, RouteMeta};
//!
//! # async fn example(browser: Arc<dyn keycloak_gate::Browser>) -> keycloak_gate::Result<()> {
//! let config = ProviderConfig::new(
//!     "https://idp.example.com/realms/main/protocol/openid-connect",
//!     "web-client",
//!     "https://app.example.com",
//! )?;
//!
//! let flow = Arc::new(AuthFlow::builder()
//!     .config(config)
//!     .browser(browser)
//!     .build()?);
//! let guard = RouteGuard::new(flow.clone());
//!
//! // Router lifecycle: before any route resolves...
//! guard.before_load("/dashboard").await;
//! // ...and once the route is known.
//! guard.after_load(RouteMeta::protected()).await?;
//!
//! if let Some(username) = flow.session().username() {
//!     println!("signed in as {username}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Only the S256 PKCE method is used; a failing entropy source is
//!   reported, never silently downgraded.
//! - The `state` parameter is generated per attempt and validated on
//!   the callback before any code is exchanged.
//! - Access-token claims are decoded without signature verification
//!   and used for UX decisions only (expiry scheduling, displayed
//!   username); authorization is always enforced server-side.
//! - Token values are never logged.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod auth;
pub mod browser;
pub mod claims;
pub mod config;
mod error;
pub mod guard;
pub mod models;
pub mod pkce;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

pub use auth::{AuthFlow, AuthFlowBuilder, FlowState};
pub use browser::{Browser, RecordingBrowser};
pub use claims::{decode_access_claims, AccessClaims};
pub use config::ProviderConfig;
pub use guard::{RouteGuard, RouteMeta};
pub use models::{CallbackParams, PendingLogin, TokenPair};
pub use pkce::{challenge_for, generate_state, PkcePair};
pub use session::Session;
pub use storage::{
    Cookie, CookieJar, CookieTokenStore, MemoryCookieJar, MemoryTokenStore, MemoryVerifierStore,
    TokenStore, VerifierStore,
};
