//! Integration tests for the login lifecycle using wiremock.
//!
//! These tests drive the full flow controller against a mocked
//! identity provider: session initialization, callback exchange,
//! silent refresh and logout.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keycloak_gate::{
    AuthFlow, Error, FlowState, MemoryTokenStore, MemoryVerifierStore, PendingLogin,
    ProviderConfig, RecordingBrowser, TokenPair, TokenStore, VerifierStore,
};

fn make_jwt(exp: i64, username: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD
        .encode(json!({"exp": exp, "preferred_username": username}).to_string());
    format!("{header}.{payload}.sig")
}

fn fresh_jwt(username: &str) -> String {
    make_jwt(chrono::Utc::now().timestamp() + 300, username)
}

fn expired_jwt(username: &str) -> String {
    make_jwt(chrono::Utc::now().timestamp() - 60, username)
}

struct TestHarness {
    flow: AuthFlow,
    browser: Arc<RecordingBrowser>,
    tokens: Arc<MemoryTokenStore>,
    pending: Arc<MemoryVerifierStore>,
}

fn harness(provider_uri: &str) -> TestHarness {
    let browser = Arc::new(RecordingBrowser::new());
    let tokens = Arc::new(MemoryTokenStore::new());
    let pending = Arc::new(MemoryVerifierStore::new());

    let config =
        ProviderConfig::new(provider_uri, "web-client", "http://localhost:5173").unwrap();
    let flow = AuthFlow::builder()
        .config(config)
        .browser(browser.clone())
        .token_store(tokens.clone())
        .verifier_store(pending.clone())
        .build()
        .unwrap();

    TestHarness {
        flow,
        browser,
        tokens,
        pending,
    }
}

fn token_response(access: &str, refresh: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 300,
        "token_type": "Bearer"
    }))
}

/// A mounted catch-all asserting zero requests reach the provider.
async fn expect_no_requests(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn test_init_with_valid_token_is_idempotent() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.tokens
        .save(&TokenPair::new(fresh_jwt("alice"), "rt-1"))
        .await
        .unwrap();

    h.flow.init().await.unwrap();
    assert_eq!(h.flow.session().username().as_deref(), Some("alice"));
    assert_eq!(h.flow.state(), FlowState::Authenticated);

    // Second call is a no-op on an authenticated session.
    h.flow.init().await.unwrap();
    assert_eq!(h.flow.session().username().as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_init_refreshes_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-old"))
        .respond_with(token_response(&fresh_jwt("alice"), "rt-new"))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.tokens
        .save(&TokenPair::new(expired_jwt("alice"), "rt-old"))
        .await
        .unwrap();

    h.flow.init().await.unwrap();

    assert_eq!(h.flow.session().username().as_deref(), Some("alice"));
    assert_eq!(h.flow.state(), FlowState::Authenticated);
    assert_eq!(
        h.tokens.refresh_token().await.unwrap().as_deref(),
        Some("rt-new")
    );
}

#[tokio::test]
async fn test_init_clears_expired_token_without_refresh_token() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.tokens.seed_access_only(expired_jwt("alice")).await;

    h.flow.init().await.unwrap();

    assert!(!h.flow.session().is_authenticated());
    assert_eq!(h.flow.state(), FlowState::Unauthenticated);
    assert!(h.tokens.access_token().await.unwrap().is_none());
}

// ============================================================================
// Login callback
// ============================================================================

#[tokio::test]
async fn test_callback_exchanges_code_and_establishes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains("code_verifier=verifier-1"))
        .respond_with(token_response(&fresh_jwt("alice"), "rt-1"))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.pending
        .save_pending(&PendingLogin {
            verifier: "verifier-1".into(),
            state: "state-1".into(),
        })
        .await
        .unwrap();
    h.browser.set_query_param("code", "auth-code-1");
    h.browser.set_query_param("state", "state-1");

    h.flow.parse_login_callback().await.unwrap();

    assert_eq!(h.flow.session().username().as_deref(), Some("alice"));
    assert_eq!(h.flow.state(), FlowState::Authenticated);
    assert!(h.tokens.load().await.unwrap().is_some());
    // The verifier is single-use.
    assert!(h.pending.load_pending().await.unwrap().is_none());
    // Exactly one navigation home after the completed login.
    assert_eq!(h.browser.navigations(), vec!["/".to_string()]);
}

#[tokio::test]
async fn test_callback_without_stored_verifier_makes_no_request() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.browser.set_query_param("code", "auth-code-1");
    h.browser.set_query_param("state", "state-1");

    let result = h.flow.parse_login_callback().await;
    assert!(matches!(result, Err(Error::CallbackMissingParams(_))));
    assert!(!h.flow.session().is_authenticated());
    assert!(h.tokens.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_rejects_mismatched_state() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.pending
        .save_pending(&PendingLogin {
            verifier: "verifier-1".into(),
            state: "state-expected".into(),
        })
        .await
        .unwrap();
    h.browser.set_query_param("code", "auth-code-1");
    h.browser.set_query_param("state", "state-forged");

    let result = h.flow.parse_login_callback().await;
    assert!(matches!(result, Err(Error::StateMismatch)));
    assert!(!h.flow.session().is_authenticated());
    // The attempt is positively invalid; the verifier is discarded.
    assert!(h.pending.load_pending().await.unwrap().is_none());
}

#[tokio::test]
async fn test_callback_failed_exchange_leaves_session_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Code not valid"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.pending
        .save_pending(&PendingLogin {
            verifier: "verifier-1".into(),
            state: "state-1".into(),
        })
        .await
        .unwrap();
    h.browser.set_query_param("code", "stale-code");
    h.browser.set_query_param("state", "state-1");

    let result = h.flow.parse_login_callback().await;
    assert!(matches!(
        result,
        Err(Error::TokenExchangeFailed { status: 400, .. })
    ));
    assert!(!h.flow.session().is_authenticated());
    assert_eq!(h.flow.state(), FlowState::Unauthenticated);
    assert!(h.tokens.load().await.unwrap().is_none());
    assert!(h.pending.load_pending().await.unwrap().is_none());
    // No navigation on failure; the guard decides the fallback.
    assert!(h.browser.navigations().is_empty());
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_concurrent_refreshes_coalesce_into_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(token_response(&fresh_jwt("alice"), "rt-new"))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.tokens
        .save(&TokenPair::new(expired_jwt("alice"), "rt-old"))
        .await
        .unwrap();

    let (a, b) = tokio::join!(h.flow.refresh("rt-old"), h.flow.refresh("rt-old"));
    a.unwrap();
    b.unwrap();

    assert_eq!(h.flow.session().username().as_deref(), Some("alice"));
    assert_eq!(
        h.tokens.refresh_token().await.unwrap().as_deref(),
        Some("rt-new")
    );
}

#[tokio::test]
async fn test_failed_refresh_forces_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Session not active"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server.uri());
    h.tokens
        .save(&TokenPair::new(expired_jwt("alice"), "rt-dead"))
        .await
        .unwrap();

    let err = h.flow.init().await.unwrap_err();
    assert!(matches!(err, Error::RefreshFailed(_)));
    assert!(err.is_session_fatal());

    assert!(!h.flow.session().is_authenticated());
    assert_eq!(h.flow.state(), FlowState::Unauthenticated);
    assert!(h.tokens.access_token().await.unwrap().is_none());
    assert!(h.tokens.refresh_token().await.unwrap().is_none());
    assert_eq!(h.browser.navigations(), vec!["/".to_string()]);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_logout_clears_state_and_redirects_with_refresh_token() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.tokens
        .save(&TokenPair::new(fresh_jwt("alice"), "rt-1"))
        .await
        .unwrap();
    h.flow.init().await.unwrap();
    assert!(h.flow.session().is_authenticated());

    h.flow.logout().await.unwrap();

    assert!(!h.flow.session().is_authenticated());
    assert!(h.tokens.load().await.unwrap().is_none());
    assert_eq!(h.flow.state(), FlowState::Unauthenticated);

    let redirects = h.browser.redirects();
    assert_eq!(redirects.len(), 1);
    assert!(redirects[0].contains("/logout?"));
    assert!(redirects[0].contains("refresh_token=rt-1"));
    assert!(redirects[0].contains("client_id=web-client"));
}

#[tokio::test]
async fn test_logout_without_refresh_token_omits_hint() {
    let server = MockServer::start().await;
    expect_no_requests(&server).await;

    let h = harness(&server.uri());
    h.flow.logout().await.unwrap();

    let redirects = h.browser.redirects();
    assert_eq!(redirects.len(), 1);
    assert!(!redirects[0].contains("refresh_token"));
    assert!(redirects[0].contains("client_id=web-client"));
}
