//! Identity provider bridge.
//!
//! Encapsulates every interaction with the managed identity provider:
//! the direct password grant, the browser-based hosted-UI flow for social
//! providers, token persistence, and sign-out. Every provider failure is
//! re-raised with a stable discriminator; callers never branch on message
//! text.

pub mod claims;
pub mod token;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::IdentitySettings;
use crate::error::{AuthError, Result};
use crate::models::OAuthTokenSet;
use crate::provider::token::{FragmentParse, OAuthErrorBody, TokenAcquisition, TokenEndpointResponse};
use crate::store::SessionCache;

/// Seconds before recorded expiry at which a session stops counting as live.
const SESSION_EXPIRY_LEEWAY_SECS: i64 = 30;

/// Opaque marker for a completed password sign-in. The session itself lives
/// inside the bridge's token slot, not in the caller's hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedIn;

/// External identity source federated through the provider's hosted UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Facebook,
}

impl SocialProvider {
    /// `identity_provider` hint value for the hosted-UI authorize endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "Google",
            SocialProvider::Facebook => "Facebook",
        }
    }
}

/// Outcome of the app-layer browser sheet.
#[derive(Debug, Clone)]
pub enum BrowserOutcome {
    /// The OS handed back the registered redirect URI, with either a query
    /// string (code flow) or a fragment (token flow).
    Redirect(Url),
    /// The user dismissed the sheet. A named outcome, not a retryable error.
    Cancelled,
}

/// Seam to the platform browser. The app layer opens the authorize URL in a
/// browser sheet and resolves with the final redirect, in bounded time.
#[async_trait]
pub trait BrowserFlow: Send + Sync {
    async fn authorize(&self, url: &str) -> Result<BrowserOutcome>;
}

/// Bridge to the managed identity provider.
pub struct ProviderBridge {
    settings: IdentitySettings,
    http: Client,
    cache: SessionCache,
    acquisition: Arc<dyn TokenAcquisition>,
    /// In-memory session slot, persisted through the cache as a fallback.
    session: RwLock<Option<OAuthTokenSet>>,
}

impl ProviderBridge {
    pub fn new(settings: IdentitySettings, http: Client, cache: SessionCache) -> Self {
        Self {
            settings,
            http,
            cache,
            acquisition: Arc::new(FragmentParse),
            session: RwLock::new(None),
        }
    }

    /// Swap the token acquisition strategy (e.g., [`token::CodeExchange`]
    /// when refresh tokens are required).
    pub fn with_acquisition(mut self, acquisition: Arc<dyn TokenAcquisition>) -> Self {
        self.acquisition = acquisition;
        self
    }

    /// Direct password grant against the provider token endpoint.
    ///
    /// Uses the fallback-compatible `grant_type=password` so the flow works
    /// without platform-native crypto modules. Incomplete sign-ins (account
    /// unconfirmed, forced reset, MFA) surface as distinctly named errors.
    pub async fn password_sign_in(&self, email: &str, password: &str) -> Result<SignedIn> {
        let response = self
            .http
            .post(self.settings.token_endpoint())
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.settings.client_id.as_str()),
                ("username", email),
                ("password", password),
                ("scope", self.settings.scopes.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_password_grant_error(status.as_u16(), &body, email));
        }

        let token_response: TokenEndpointResponse = response.json().await?;
        let tokens = token_response.into_token_set();
        self.install_session(tokens).await;

        info!(email = %email, "Password sign-in completed");
        Ok(SignedIn)
    }

    /// Whether a live provider session exists. Falls back to tokens
    /// persisted by an earlier run on a cold start.
    pub async fn current_session(&self) -> bool {
        if let Some(tokens) = self.session.read().await.as_ref() {
            return !tokens.is_expired(SESSION_EXPIRY_LEEWAY_SECS);
        }

        match self.restore_session().await {
            Some(tokens) => {
                let live = !tokens.is_expired(SESSION_EXPIRY_LEEWAY_SECS);
                if live {
                    *self.session.write().await = Some(tokens);
                }
                live
            }
            None => false,
        }
    }

    /// Rebuild a token set from the cached raw tokens. Expiry comes from the
    /// id token's own `exp` claim; the token was persisted by us after a
    /// trusted-channel fetch, so decoding it here stays within that trust
    /// boundary.
    async fn restore_session(&self) -> Option<OAuthTokenSet> {
        let (id_token, access_token, refresh_token) = self.cache.load_tokens().await?;
        let expires_at = match claims::decode_id_token(&id_token) {
            Ok(c) => c.expires_at(),
            Err(e) => {
                warn!(error = %e, "Cached id token is undecodable, ignoring");
                return None;
            }
        };
        Some(OAuthTokenSet {
            id_token,
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Bearer credential for backend requests: the live session's id token,
    /// else the persisted raw token as the fallback path.
    pub async fn bearer_token(&self) -> Option<String> {
        if let Some(tokens) = self.session.read().await.as_ref() {
            if !tokens.is_expired(SESSION_EXPIRY_LEEWAY_SECS) {
                return Some(tokens.id_token.clone());
            }
        }
        self.cache.fallback_bearer().await
    }

    /// Invalidate the local session. The revocation call is best-effort and
    /// detached: sign-out returns as soon as the slot is cleared and never
    /// waits on the network.
    pub async fn sign_out(&self) {
        let tokens = self.session.write().await.take();

        let revocable = tokens
            .as_ref()
            .and_then(|t| t.refresh_token.clone().or_else(|| Some(t.access_token.clone())));
        if let Some(token) = revocable {
            let http = self.http.clone();
            let endpoint = self.settings.revoke_endpoint();
            let client_id = self.settings.client_id.clone();
            tokio::spawn(async move {
                let result = http
                    .post(endpoint)
                    .form(&[("token", token.as_str()), ("client_id", client_id.as_str())])
                    .send()
                    .await;
                match result {
                    Ok(response) if !response.status().is_success() => {
                        warn!(status = %response.status(), "Token revocation returned non-success");
                    }
                    Err(e) => warn!(error = %e, "Token revocation failed"),
                    _ => debug!("Token revoked"),
                }
            });
        }

        info!("Provider session cleared");
    }

    /// Browser-based hosted-UI flow for a social provider.
    ///
    /// Opens the consent screen through the injected [`BrowserFlow`], then
    /// acquires tokens with the configured strategy. Dismissal resolves as
    /// [`AuthError::SocialFlowCancelled`], never a hang.
    pub async fn social_sign_in(
        &self,
        provider: SocialProvider,
        browser: &dyn BrowserFlow,
    ) -> Result<OAuthTokenSet> {
        let state = Uuid::new_v4().to_string();
        let url = self.authorize_url(provider, &state);
        debug!(provider = provider.as_str(), "Opening hosted-UI authorize URL");

        let redirect = match browser.authorize(&url).await? {
            BrowserOutcome::Redirect(redirect) => redirect,
            BrowserOutcome::Cancelled => {
                info!(provider = provider.as_str(), "Social sign-in cancelled");
                return Err(AuthError::SocialFlowCancelled);
            }
        };

        let tokens = self.acquisition.acquire(&redirect, &state).await?;
        self.install_session(tokens.clone()).await;

        info!(provider = provider.as_str(), "Social sign-in completed");
        Ok(tokens)
    }

    /// Hosted-UI authorize URL for the given social provider.
    pub fn authorize_url(&self, provider: SocialProvider, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type={}&scope={}&identity_provider={}&state={}",
            self.settings.authorize_endpoint(),
            self.settings.client_id,
            urlencoding::encode(&self.settings.redirect_uri),
            self.acquisition.response_type(),
            urlencoding::encode(&self.settings.scopes),
            provider.as_str(),
            state
        );
        if self.settings.force_account_picker {
            url.push_str("&prompt=select_account");
        }
        url
    }

    async fn install_session(&self, tokens: OAuthTokenSet) {
        self.cache.store_tokens(&tokens).await;
        *self.session.write().await = Some(tokens);
    }
}

/// Map a token-endpoint failure to the taxonomy by its stable error code.
/// Unrecognized codes land in `Unknown` and log full detail: they indicate
/// a gap in the taxonomy.
fn map_password_grant_error(status: u16, body: &str, email: &str) -> AuthError {
    let parsed: OAuthErrorBody = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) => {
            return AuthError::Transport(format!("token endpoint failed ({}): {}", status, body))
        }
    };

    match parsed.error.as_str() {
        // No account-existence oracle: unknown users look like bad passwords
        "invalid_grant" | "user_not_found" => AuthError::InvalidCredentials,
        "user_not_confirmed" => AuthError::AccountNotConfirmed {
            email: email.to_string(),
        },
        "password_reset_required" | "mfa_required" => AuthError::AdditionalChallengeRequired {
            challenge: parsed.error,
        },
        other => {
            tracing::error!(
                code = %other,
                description = %parsed.error_description.unwrap_or_default(),
                status = status,
                "Unmapped token endpoint error"
            );
            AuthError::Unknown(format!("token endpoint error: {}", other))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;

    fn settings() -> IdentitySettings {
        IdentitySettings {
            base_url: "https://auth.example.com".into(),
            client_id: "client-123".into(),
            redirect_uri: "kodisha://auth/callback".into(),
            scopes: "openid profile email".into(),
            logout_redirect_uri: "kodisha://auth/signout".into(),
            force_account_picker: true,
        }
    }

    fn bridge() -> ProviderBridge {
        ProviderBridge::new(
            settings(),
            Client::new(),
            SessionCache::new(Arc::new(MemorySessionStore::new())),
        )
    }

    #[test]
    fn authorize_url_carries_required_params() {
        let url = bridge().authorize_url(SocialProvider::Google, "state-1");
        assert!(url.starts_with("https://auth.example.com/oauth2/authorize?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("identity_provider=Google"));
        assert!(url.contains("state=state-1"));
        assert!(url.contains("prompt=select_account"));
        assert!(url.contains(&urlencoding::encode("kodisha://auth/callback").to_string()));
    }

    #[test]
    fn code_exchange_strategy_switches_response_type() {
        let b = bridge().with_acquisition(Arc::new(token::CodeExchange::new(
            settings(),
            Client::new(),
        )));
        let url = b.authorize_url(SocialProvider::Facebook, "s");
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn unconfirmed_beats_wrong_password() {
        // The provider reports the confirmation gate before evaluating the
        // password, so the discriminator is stable either way
        let err = map_password_grant_error(
            400,
            r#"{"error":"user_not_confirmed","error_description":"User is not confirmed."}"#,
            "a@x.com",
        );
        assert_eq!(err.kind(), "account_not_confirmed");
        match err {
            AuthError::AccountNotConfirmed { email } => assert_eq!(email, "a@x.com"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn invalid_grant_maps_to_invalid_credentials() {
        let err = map_password_grant_error(400, r#"{"error":"invalid_grant"}"#, "a@x.com");
        assert_eq!(err.kind(), "invalid_credentials");

        let err = map_password_grant_error(400, r#"{"error":"user_not_found"}"#, "a@x.com");
        assert_eq!(err.kind(), "invalid_credentials");
    }

    #[test]
    fn challenge_codes_carry_the_raw_challenge() {
        let err = map_password_grant_error(400, r#"{"error":"mfa_required"}"#, "a@x.com");
        match err {
            AuthError::AdditionalChallengeRequired { challenge } => {
                assert_eq!(challenge, "mfa_required")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unparseable_body_is_a_transport_failure() {
        let err = map_password_grant_error(502, "<html>bad gateway</html>", "a@x.com");
        assert_eq!(err.kind(), "transport_failure");
    }

    #[test]
    fn unknown_code_lands_in_unknown() {
        let err = map_password_grant_error(400, r#"{"error":"slow_down"}"#, "a@x.com");
        assert_eq!(err.kind(), "unknown");
    }
}
