//! HTTP calls against the identity provider's token and userinfo
//! endpoints.
//!
//! The token endpoint is form-encoded with two grant types:
//!
//! - `authorization_code` + `client_id` + `redirect_uri` + `code` +
//!   `code_verifier` (PKCE exchange)
//! - `refresh_token` + `client_id` + `refresh_token`
//!
//! Success is a 2xx JSON body with `access_token` and
//! `refresh_token`; failure is a non-2xx JSON error payload. Nothing
//! here retries: retry policy, if any, belongs to a caller.

use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::models::{TokenErrorResponse, TokenPair, TokenResponse};

/// Exchange an authorization code (plus its PKCE verifier) for a
/// token pair.
///
/// # Errors
///
/// Returns [`Error::TokenExchangeFailed`] with the provider's error
/// payload on a non-2xx status; transport and JSON failures surface
/// as [`Error::Http`] / [`Error::Json`].
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &ProviderConfig,
    code: &str,
    verifier: &str,
) -> Result<TokenPair> {
    debug!("exchanging authorization code for tokens");

    let response = client
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id()),
            ("redirect_uri", &config.redirect_uri()),
            ("code", code),
            ("code_verifier", verifier),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
            warn!(
                error = %err.error,
                description = ?err.error_description,
                "token exchange rejected"
            );
        }
        return Err(Error::TokenExchangeFailed {
            status: status.as_u16(),
            body,
        });
    }

    let token_response: TokenResponse = serde_json::from_str(&body)?;
    debug!("token exchange successful");
    Ok(token_response.into())
}

/// Obtain a fresh token pair from a refresh token.
///
/// # Errors
///
/// Every failure mode maps to [`Error::RefreshFailed`]; the caller
/// treats it as session expiry, not a retryable condition.
pub async fn refresh_token(
    client: &reqwest::Client,
    config: &ProviderConfig,
    refresh_token: &str,
) -> Result<TokenPair> {
    debug!("refreshing access token");

    let response = client
        .post(config.token_endpoint())
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", config.client_id()),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await
        .map_err(|e| Error::RefreshFailed(format!("refresh request failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::RefreshFailed(format!("failed to read refresh response: {e}")))?;

    if !status.is_success() {
        if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
            warn!(
                error = %err.error,
                description = ?err.error_description,
                "token refresh rejected"
            );
        }
        return Err(Error::RefreshFailed(format!(
            "token endpoint returned {}: {body}",
            status.as_u16()
        )));
    }

    let token_response: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| Error::RefreshFailed(format!("failed to parse refresh response: {e}")))?;

    debug!("token refresh successful");
    Ok(token_response.into())
}

/// Fetch the provider's userinfo claims with a bearer token.
///
/// The decoded JSON body is returned as-is; a non-2xx status surfaces
/// as [`Error::UserInfoFailed`] untouched. No retry, no caching.
pub async fn fetch_userinfo(
    client: &reqwest::Client,
    config: &ProviderConfig,
    access_token: &str,
) -> Result<serde_json::Value> {
    let response = client
        .get(config.userinfo_endpoint())
        .bearer_auth(access_token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::UserInfoFailed {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}
