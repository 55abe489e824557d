//! Route guard hooks bridging the router to the auth flow.
//!
//! Two hooks, mapped onto the router's lifecycle:
//!
//! - [`RouteGuard::before_load`] runs before any route resolves. On
//!   the callback route it completes the pending login; everywhere
//!   else it (re)establishes the session from stored tokens. Errors
//!   are logged, the session degrades to unauthenticated, and the
//!   route always resolves; an auth failure never breaks navigation.
//! - [`RouteGuard::after_load`] runs once the route is known. A
//!   protected route with no authenticated session redirects to the
//!   provider's login page.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::AuthFlow;
use crate::config::{CALLBACK_PATH, HOME_PATH};
use crate::error::Result;

/// Per-route metadata consulted by [`RouteGuard::after_load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    /// Whether the route requires an authenticated session.
    pub require_auth: bool,
}

impl RouteMeta {
    /// Metadata for a route requiring authentication.
    pub fn protected() -> Self {
        Self { require_auth: true }
    }

    /// Metadata for a publicly accessible route.
    pub fn public() -> Self {
        Self {
            require_auth: false,
        }
    }
}

/// Router integration over an [`AuthFlow`].
#[derive(Debug, Clone)]
pub struct RouteGuard {
    flow: Arc<AuthFlow>,
}

impl RouteGuard {
    /// Create a guard over `flow`.
    pub fn new(flow: Arc<AuthFlow>) -> Self {
        Self { flow }
    }

    /// The underlying flow.
    pub fn flow(&self) -> &Arc<AuthFlow> {
        &self.flow
    }

    /// Pre-resolution hook. Never fails navigation: every error is
    /// absorbed here after the flow has already degraded the session.
    pub async fn before_load(&self, path: &str) {
        if path == CALLBACK_PATH {
            if let Err(e) = self.flow.parse_login_callback().await {
                warn!(error = %e, "login callback failed, returning home");
                self.flow.browser().navigate(HOME_PATH);
            }
            return;
        }

        if let Err(e) = self.flow.init().await {
            warn!(error = %e, "session initialization failed");
        }
    }

    /// Post-resolution hook. Redirects to the provider's login page
    /// when the resolved route requires auth and no session exists.
    ///
    /// # Errors
    ///
    /// Propagates login-initiation failures
    /// ([`Error::CryptoUnavailable`](crate::Error::CryptoUnavailable),
    /// storage errors); the caller decides how to surface them.
    pub async fn after_load(&self, meta: RouteMeta) -> Result<()> {
        if meta.require_auth && !self.flow.session().is_authenticated() {
            debug!("protected route without a session, starting login");
            self.flow.redirect_to_login().await?;
        }
        Ok(())
    }
}
