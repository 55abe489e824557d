//! The navigation/URL seam between the session core and its host.
//!
//! The core never touches the page directly; everything it needs from
//! the surrounding application is behind this trait: moving the
//! browser to an in-app path, leaving the page for a provider URL,
//! and reading the current URL's query parameters.

use std::collections::HashMap;
use std::sync::Mutex;

/// Host-environment primitives required by the session core.
pub trait Browser: Send + Sync {
    /// In-app navigation to a path, e.g. `/`.
    fn navigate(&self, path: &str);

    /// Full-page navigation to an absolute URL (authorization and
    /// logout endpoints). Under normal success this does not return
    /// control to the flow; the browser leaves the page.
    fn redirect(&self, url: &str);

    /// Read a query parameter from the current URL.
    fn query_param(&self, name: &str) -> Option<String>;
}

/// In-memory [`Browser`] that records navigations instead of
/// performing them. Used in tests and non-browser embeddings.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    navigations: Mutex<Vec<String>>,
    redirects: Mutex<Vec<String>>,
    query: Mutex<HashMap<String, String>>,
}

impl RecordingBrowser {
    /// Create a browser with an empty URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a query parameter on the simulated current URL.
    pub fn set_query_param(&self, name: impl Into<String>, value: impl Into<String>) {
        self.query.lock().unwrap().insert(name.into(), value.into());
    }

    /// All in-app navigations performed so far.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// All full-page redirects performed so far.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Browser for RecordingBrowser {
    fn navigate(&self, path: &str) {
        self.navigations.lock().unwrap().push(path.to_string());
    }

    fn redirect(&self, url: &str) {
        self.redirects.lock().unwrap().push(url.to_string());
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query.lock().unwrap().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_browser_tracks_calls() {
        let browser = RecordingBrowser::new();
        browser.set_query_param("code", "abc");

        browser.navigate("/");
        browser.redirect("https://idp.example.com/auth?x=1");

        assert_eq!(browser.query_param("code").as_deref(), Some("abc"));
        assert!(browser.query_param("state").is_none());
        assert_eq!(browser.navigations(), vec!["/".to_string()]);
        assert_eq!(browser.redirects().len(), 1);
    }
}
