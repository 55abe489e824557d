//! Application-wide authenticated-identity holder.

use std::sync::Arc;

use tokio::sync::watch;

/// The current authenticated identity, observed by the route guard
/// and UI.
///
/// Explicitly constructed and passed by handle (cheap [`Clone`])
/// rather than held as a process-wide global. Reads are synchronous
/// with respect to the controller's assignment: after
/// [`AuthFlow`](crate::auth::AuthFlow) sets the username, every
/// subsequent [`Session::username`] call sees the new value, with no
/// buffering or async propagation delay.
///
/// The session carries no validation logic of its own; it is a pure
/// projection mutated exclusively by the auth flow controller.
#[derive(Debug, Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Session {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Current username, or `None` when unauthenticated.
    pub fn username(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    /// Whether a user is currently authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Subscribe to identity changes for reactive observers (UI).
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    /// Assign the identity. Controller-only.
    pub(crate) fn set(&self, username: impl Into<String>) {
        self.tx.send_replace(Some(username.into()));
    }

    /// Clear the identity. Controller-only.
    pub(crate) fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unauthenticated() {
        let session = Session::new();
        assert!(session.username().is_none());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_set_is_synchronously_visible() {
        let session = Session::new();
        let observer = session.clone();

        session.set("alice");
        assert_eq!(observer.username().as_deref(), Some("alice"));

        session.clear();
        assert!(observer.username().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = Session::new();
        let mut rx = session.subscribe();

        session.set("alice");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_deref(), Some("alice"));
    }
}
