//! Token acquisition strategies for the browser-redirect flow.
//!
//! Two strategies coexist behind one interface:
//! - [`FragmentParse`] reads the token response straight out of the redirect
//!   fragment (`response_type=token`). No further network hop is needed to
//!   obtain the raw tokens, at the cost of refresh-token issuance.
//! - [`CodeExchange`] reads an authorization code from the redirect query
//!   string (`response_type=code`) and exchanges it at the provider token
//!   endpoint. One extra call to the *provider*, still none to our backend;
//!   kept for flows that need a refresh token.
//!
//! `FragmentParse` is the default strategy.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

use crate::config::IdentitySettings;
use crate::error::{AuthError, Result};
use crate::models::OAuthTokenSet;

/// Successful response from the provider token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointResponse {
    pub access_token: String,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenEndpointResponse {
    pub(crate) fn into_token_set(self) -> OAuthTokenSet {
        OAuthTokenSet::from_expires_in(
            self.id_token,
            self.access_token,
            self.refresh_token,
            self.expires_in,
        )
    }
}

/// Error body from the provider token endpoint. The `error` field is the
/// stable code control flow branches on; the description is display-only.
#[derive(Debug, Deserialize)]
pub(crate) struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// How tokens are obtained once the browser flow hands back a redirect URL.
#[async_trait]
pub trait TokenAcquisition: Send + Sync {
    /// `response_type` the authorize URL must request for this strategy.
    fn response_type(&self) -> &'static str;

    /// Parse/exchange the redirect into a token set. The state nonce issued
    /// when the flow started must round-trip unchanged.
    async fn acquire(&self, redirect: &Url, expected_state: &str) -> Result<OAuthTokenSet>;
}

/// Implicit-style strategy: tokens arrive in the redirect URL fragment.
#[derive(Debug, Default)]
pub struct FragmentParse;

#[async_trait]
impl TokenAcquisition for FragmentParse {
    fn response_type(&self) -> &'static str {
        "token"
    }

    async fn acquire(&self, redirect: &Url, expected_state: &str) -> Result<OAuthTokenSet> {
        let fragment = redirect
            .fragment()
            .ok_or_else(|| AuthError::Unknown("redirect carried no fragment".to_string()))?;
        let params: HashMap<String, String> = url::form_urlencoded::parse(fragment.as_bytes())
            .into_owned()
            .collect();

        if let Some(err) = flow_error(&params) {
            return Err(err);
        }
        verify_state(params.get("state").map(String::as_str), expected_state)?;

        let access_token = params
            .get("access_token")
            .cloned()
            .ok_or_else(|| AuthError::Unknown("redirect fragment carried no tokens".to_string()))?;
        let id_token = params
            .get("id_token")
            .cloned()
            .ok_or_else(|| AuthError::Unknown("redirect fragment carried no id token".to_string()))?;
        let expires_in = params.get("expires_in").and_then(|v| v.parse().ok());

        debug!("Parsed token response from redirect fragment");
        Ok(OAuthTokenSet::from_expires_in(
            id_token,
            access_token,
            None,
            expires_in,
        ))
    }
}

/// Authorization-code strategy: the code in the redirect query string is
/// exchanged at the provider token endpoint.
#[derive(Clone)]
pub struct CodeExchange {
    settings: IdentitySettings,
    http: Client,
}

impl CodeExchange {
    pub fn new(settings: IdentitySettings, http: Client) -> Self {
        Self { settings, http }
    }

    /// POST the authorization code to the token endpoint. Non-2xx raises
    /// carrying the response body for diagnostics.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthTokenSet> {
        let response = self
            .http
            .post(self.settings.token_endpoint())
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.settings.client_id.as_str()),
                ("code", code),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Token exchange failed");
            return Err(AuthError::Transport(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let token_response: TokenEndpointResponse = response.json().await?;
        Ok(token_response.into_token_set())
    }
}

#[async_trait]
impl TokenAcquisition for CodeExchange {
    fn response_type(&self) -> &'static str {
        "code"
    }

    async fn acquire(&self, redirect: &Url, expected_state: &str) -> Result<OAuthTokenSet> {
        let params: HashMap<String, String> = redirect.query_pairs().into_owned().collect();

        if let Some(err) = flow_error(&params) {
            return Err(err);
        }
        verify_state(params.get("state").map(String::as_str), expected_state)?;

        let code = params
            .get("code")
            .ok_or_else(|| AuthError::Unknown("redirect carried no authorization code".to_string()))?;

        self.exchange_code(code).await
    }
}

/// Map an `error` parameter on the redirect to the taxonomy. The hosted UI
/// reports a consent-screen dismissal as `access_denied`.
fn flow_error(params: &HashMap<String, String>) -> Option<AuthError> {
    let code = params.get("error")?;
    let description = params
        .get("error_description")
        .cloned()
        .unwrap_or_default();
    match code.as_str() {
        "access_denied" => Some(AuthError::SocialFlowCancelled),
        _ => {
            error!(code = %code, description = %description, "Authorization redirect error");
            Some(AuthError::Unknown(format!("{}: {}", code, description)))
        }
    }
}

fn verify_state(returned: Option<&str>, expected: &str) -> Result<()> {
    match returned {
        Some(state) if state == expected => Ok(()),
        _ => {
            error!("OAuth state mismatch on redirect");
            Err(AuthError::Unknown("oauth state mismatch".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fragment_parse_extracts_tokens() {
        let url = Url::parse(
            "kodisha://auth/callback#access_token=at&id_token=it&expires_in=3600&state=s1",
        )
        .unwrap();
        let tokens = FragmentParse.acquire(&url, "s1").await.unwrap();
        assert_eq!(tokens.access_token, "at");
        assert_eq!(tokens.id_token, "it");
        assert!(tokens.refresh_token.is_none());
        assert!(tokens.expires_at.is_some());
    }

    #[tokio::test]
    async fn fragment_without_tokens_fails_explicitly() {
        let url = Url::parse("kodisha://auth/callback#state=s1").unwrap();
        let err = FragmentParse.acquire(&url, "s1").await.unwrap_err();
        assert_eq!(err.kind(), "unknown");
    }

    #[tokio::test]
    async fn access_denied_maps_to_cancelled() {
        let url = Url::parse("kodisha://auth/callback#error=access_denied&state=s1").unwrap();
        let err = FragmentParse.acquire(&url, "s1").await.unwrap_err();
        assert_eq!(err.kind(), "social_flow_cancelled");
    }

    #[tokio::test]
    async fn state_mismatch_is_rejected() {
        let url =
            Url::parse("kodisha://auth/callback#access_token=at&id_token=it&state=other").unwrap();
        assert!(FragmentParse.acquire(&url, "s1").await.is_err());
    }
}
