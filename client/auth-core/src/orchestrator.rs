//! Auth orchestrator: the single entry point the rest of the app calls.
//!
//! Hides which underlying path served a request. Sign-up goes through the
//! backend (which provisions the account in both the identity provider and
//! the user table); sign-in goes through the provider bridge. The asymmetry
//! is intentional: a direct provider sign-up would bypass backend-side
//! account provisioning.

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::backend::{ApplicationStatus, BackendClient, MutationStatus};
use crate::error::{AuthError, Result};
use crate::models::{LandlordApplicationInput, SignUpInput, UpdateUserInput, UserProfile};
use crate::provider::{claims, BrowserFlow, ProviderBridge, SocialProvider};
use crate::store::SessionCache;

/// Normalized outcome of any authentication flow. Both the password and
/// social paths resolve to this one shape; failures are the `Err` arm with
/// a stable [`AuthError::kind`].
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Authenticated(UserProfile),
    NeedsVerification { email: String },
    Cancelled,
}

pub struct AuthOrchestrator {
    bridge: Arc<ProviderBridge>,
    backend: BackendClient,
    cache: SessionCache,
}

impl AuthOrchestrator {
    pub fn new(bridge: Arc<ProviderBridge>, backend: BackendClient, cache: SessionCache) -> Self {
        Self {
            bridge,
            backend,
            cache,
        }
    }

    /// Backend sign-up. Never touches the provider bridge directly; the
    /// backend provisions both sides atomically from the client's view.
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<AuthOutcome> {
        input.validate()?;
        let status = self.backend.sign_up(input).await?;
        info!(email = %input.email, message = ?status.message, "Sign-up accepted, verification required");
        Ok(AuthOutcome::NeedsVerification {
            email: input.email.clone(),
        })
    }

    /// Password sign-in, then an immediate authoritative profile fetch.
    ///
    /// A profile fetch failure after a successful grant rolls the session
    /// back: a session without a profile is not a state this core allows.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        self.bridge.password_sign_in(email, password).await?;
        self.fetch_profile_or_roll_back().await
    }

    /// Hosted-UI social flow. Dismissal resolves as `Cancelled`.
    pub async fn social_sign_in(
        &self,
        provider: SocialProvider,
        browser: &dyn BrowserFlow,
    ) -> Result<AuthOutcome> {
        let tokens = match self.bridge.social_sign_in(provider, browser).await {
            Ok(tokens) => tokens,
            Err(AuthError::SocialFlowCancelled) => return Ok(AuthOutcome::Cancelled),
            Err(e) => return Err(e),
        };

        // Claims are informational only; the backend profile stays authoritative
        match claims::decode_id_token(&tokens.id_token) {
            Ok(c) => debug!(sub = %c.sub, email = ?c.email, "Social identity token decoded"),
            Err(e) => warn!(error = %e, "Social identity token undecodable"),
        }

        let profile = self.fetch_profile_or_roll_back().await?;
        Ok(AuthOutcome::Authenticated(profile))
    }

    /// Social sign-up is the same flow as social sign-in: first-login
    /// account provisioning is handled by the provider's link-or-create
    /// behavior on the backend side.
    pub async fn social_sign_up(
        &self,
        provider: SocialProvider,
        browser: &dyn BrowserFlow,
    ) -> Result<AuthOutcome> {
        self.social_sign_in(provider, browser).await
    }

    /// Clear the provider session and everything persisted locally. The
    /// local clear is never conditioned on network success.
    pub async fn sign_out(&self) {
        self.bridge.sign_out().await;
        self.cache.clear().await;
    }

    /// The authoritative profile, always fetched from the backend.
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        let bearer = self
            .bridge
            .bearer_token()
            .await
            .ok_or(AuthError::InvalidCredentials)?;
        self.backend.get_me(&bearer).await
    }

    async fn fetch_profile_or_roll_back(&self) -> Result<UserProfile> {
        match self.fetch_profile().await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                warn!(
                    kind = e.kind(),
                    error = %e,
                    "Profile fetch failed after sign-in, rolling session back"
                );
                self.sign_out().await;
                Err(e)
            }
        }
    }

    // Pass-throughs to backend mutations. None of these mutate session
    // state; they operate on not-yet-authenticated accounts or out-of-band
    // credential reset.

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<MutationStatus> {
        self.backend.verify_email(email, code).await
    }

    pub async fn resend_verification_code(&self, email: &str) -> Result<MutationStatus> {
        self.backend.resend_verification_code(email).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MutationStatus> {
        self.backend.forgot_password(email).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<MutationStatus> {
        if !crate::validators::validate_password(new_password) {
            return Err(AuthError::Validation(
                "password must be 8-128 characters with at least one letter and one digit"
                    .to_string(),
            ));
        }
        self.backend.reset_password(email, code, new_password).await
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> Result<MutationStatus> {
        input.validate()?;
        let bearer = self
            .bridge
            .bearer_token()
            .await
            .ok_or(AuthError::InvalidCredentials)?;
        self.backend.update_user(input, &bearer).await
    }

    pub async fn submit_landlord_application(
        &self,
        input: &LandlordApplicationInput,
    ) -> Result<ApplicationStatus> {
        input.validate()?;
        let bearer = self
            .bridge
            .bearer_token()
            .await
            .ok_or(AuthError::InvalidCredentials)?;
        self.backend.submit_landlord_application(input, &bearer).await
    }

    pub(crate) fn bridge(&self) -> &ProviderBridge {
        &self.bridge
    }
}
