//! Application auth context: the stateful façade and single source of truth
//! for the rest of the app.
//!
//! State machine: `Initializing` -> (`SignedIn` | `SignedOut`), with
//! sign-in/sign-out transitions between the two stable states. In every
//! reachable state `is_authenticated()` agrees with `current_user()`:
//! a signed-in state always carries a profile.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::backend::{ApplicationStatus, BackendClient, MutationStatus};
use crate::config::Settings;
use crate::error::{AuthError, Result};
use crate::models::{
    LandlordApplicationInput, PendingVerification, SignUpInput, UpdateUserInput, UserProfile,
    UserProfilePatch,
};
use crate::orchestrator::{AuthOrchestrator, AuthOutcome};
use crate::provider::{BrowserFlow, ProviderBridge, SocialProvider};
use crate::store::{SessionCache, SessionStore};

/// Lifecycle state of the auth context.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// App start: session restore in progress.
    Initializing,
    SignedOut,
    SignedIn(UserProfile),
}

/// Owned auth state object, created at app start and living for the process
/// lifetime. All collaborators are injected; reset happens only through
/// explicit sign-out.
pub struct AuthContext {
    orchestrator: AuthOrchestrator,
    cache: SessionCache,
    state: RwLock<SessionState>,
    pending: RwLock<Option<PendingVerification>>,
    /// Single-slot guards: a re-entrant call in the same operation group
    /// fails fast instead of interleaving store writes.
    session_guard: Mutex<()>,
    profile_guard: Mutex<()>,
}

impl AuthContext {
    /// Build the full stack from settings: shared HTTP client with a bounded
    /// timeout, provider bridge, backend client, orchestrator.
    pub fn new(settings: Settings, store: Arc<dyn SessionStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .build()
            .map_err(|e| AuthError::Configuration(format!("http client: {}", e)))?;

        let cache = SessionCache::new(store);
        let bridge = Arc::new(ProviderBridge::new(
            settings.identity,
            http.clone(),
            cache.clone(),
        ));
        let backend = BackendClient::new(settings.backend, http);
        let orchestrator = AuthOrchestrator::new(bridge, backend, cache.clone());

        Ok(Self::from_parts(orchestrator, cache))
    }

    /// Assemble from pre-built collaborators (tests, custom acquisition
    /// strategies).
    pub fn from_parts(orchestrator: AuthOrchestrator, cache: SessionCache) -> Self {
        Self {
            orchestrator,
            cache,
            state: RwLock::new(SessionState::Initializing),
            pending: RwLock::new(None),
            session_guard: Mutex::new(()),
            profile_guard: Mutex::new(()),
        }
    }

    // ----- State inspection -----

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn is_loading(&self) -> bool {
        matches!(*self.state.read().await, SessionState::Initializing)
    }

    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.state.read().await, SessionState::SignedIn(_))
    }

    pub async fn current_user(&self) -> Option<UserProfile> {
        match &*self.state.read().await {
            SessionState::SignedIn(profile) => Some(profile.clone()),
            _ => None,
        }
    }

    pub async fn pending_verification(&self) -> Option<PendingVerification> {
        self.pending.read().await.clone()
    }

    pub async fn dismiss_pending_verification(&self) {
        *self.pending.write().await = None;
    }

    // ----- Lifecycle -----

    /// Session restore at app start.
    ///
    /// A live provider session resolves to the cached profile without a
    /// network round trip, or to a backend fetch when the cache is empty.
    /// No session means signed-out, and any stale cached profile is cleared
    /// rather than trusted.
    pub async fn initialize(&self) {
        let next = if self.orchestrator.bridge().current_session().await {
            match self.cache.load_profile().await {
                Some(profile) => {
                    info!("Session restored from cache");
                    SessionState::SignedIn(profile)
                }
                None => match self.orchestrator.fetch_profile().await {
                    Ok(profile) => {
                        if let Err(e) = self.cache.store_profile(&profile).await {
                            warn!(error = %e, "Profile cache refill failed");
                        }
                        info!("Session restored from backend");
                        SessionState::SignedIn(profile)
                    }
                    Err(e) => {
                        // A session without a profile violates the core
                        // invariant; fail closed
                        warn!(kind = e.kind(), error = %e, "Session restore failed, signing out");
                        self.orchestrator.sign_out().await;
                        SessionState::SignedOut
                    }
                },
            }
        } else {
            self.cache.clear().await;
            SessionState::SignedOut
        };

        *self.state.write().await = next;
    }

    // ----- Session-changing operations -----

    /// Password sign-in. On success state and store update together; on any
    /// failure prior state is left untouched.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        let _guard = self
            .session_guard
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        match self.orchestrator.sign_in(email, password).await {
            Ok(profile) => {
                self.commit_sign_in(profile).await
            }
            Err(AuthError::AccountNotConfirmed { email }) => {
                // Thread the email through so the UI can open verification
                *self.pending.write().await = Some(PendingVerification {
                    email: email.clone(),
                });
                Err(AuthError::AccountNotConfirmed { email })
            }
            Err(e) => Err(e),
        }
    }

    /// Backend sign-up. State stays signed-out; the account still needs
    /// email verification.
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<AuthOutcome> {
        let _guard = self
            .session_guard
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        let outcome = self.orchestrator.sign_up(input).await?;
        if let AuthOutcome::NeedsVerification { email } = &outcome {
            *self.pending.write().await = Some(PendingVerification {
                email: email.clone(),
            });
        }
        Ok(outcome)
    }

    pub async fn social_sign_in(
        &self,
        provider: SocialProvider,
        browser: &dyn BrowserFlow,
    ) -> Result<AuthOutcome> {
        let _guard = self
            .session_guard
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        match self.orchestrator.social_sign_in(provider, browser).await? {
            AuthOutcome::Authenticated(profile) => {
                let profile = self.commit_sign_in(profile).await?;
                Ok(AuthOutcome::Authenticated(profile))
            }
            other => Ok(other),
        }
    }

    /// Social sign-up and sign-in are the same flow; see
    /// [`AuthOrchestrator::social_sign_up`].
    pub async fn social_sign_up(
        &self,
        provider: SocialProvider,
        browser: &dyn BrowserFlow,
    ) -> Result<AuthOutcome> {
        self.social_sign_in(provider, browser).await
    }

    /// Sign out. Always lands signed-out locally, idempotent, and never
    /// conditioned on network success.
    pub async fn sign_out(&self) {
        let _guard = self.session_guard.lock().await;
        self.orchestrator.sign_out().await;
        *self.state.write().await = SessionState::SignedOut;
        *self.pending.write().await = None;
        info!("Signed out");
    }

    async fn commit_sign_in(&self, profile: UserProfile) -> Result<UserProfile> {
        if let Err(e) = self.cache.store_profile(&profile).await {
            // The session cannot be recorded; roll back rather than report
            // a sign-in the next launch cannot restore
            warn!(error = %e, "Profile persistence failed, rolling sign-in back");
            self.orchestrator.sign_out().await;
            return Err(e);
        }
        *self.state.write().await = SessionState::SignedIn(profile.clone());
        *self.pending.write().await = None;
        Ok(profile)
    }

    // ----- Profile operations -----

    /// Re-fetch and replace the cached profile. A failed refresh keeps the
    /// previous profile and never demotes to signed-out: a network blip must
    /// not force a re-login.
    pub async fn refresh_user(&self) -> Result<UserProfile> {
        let _guard = self
            .profile_guard
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        if !self.is_authenticated().await {
            return Err(AuthError::InvalidCredentials);
        }

        match self.orchestrator.fetch_profile().await {
            Ok(profile) => {
                // Sign-out runs under a different guard and may have landed
                // while the fetch was in flight; commit only while still
                // signed in, never resurrect a cleared session
                let mut state = self.state.write().await;
                if !matches!(*state, SessionState::SignedIn(_)) {
                    info!("Signed out during refresh, discarding fetched profile");
                    return Err(AuthError::InvalidCredentials);
                }
                if let Err(e) = self.cache.store_profile(&profile).await {
                    warn!(error = %e, "Profile cache write failed on refresh");
                }
                *state = SessionState::SignedIn(profile.clone());
                Ok(profile)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Profile refresh failed, keeping previous profile");
                Err(e)
            }
        }
    }

    /// Optimistic partial update without a round trip. Unpatched fields are
    /// preserved; the backend overwrites on the next refresh.
    pub async fn set_local_user(&self, patch: &UserProfilePatch) -> Result<UserProfile> {
        let _guard = self
            .profile_guard
            .try_lock()
            .map_err(|_| AuthError::OperationInFlight)?;

        let mut merged = match self.current_user().await {
            Some(profile) => profile,
            None => return Err(AuthError::InvalidCredentials),
        };
        patch.merge_into(&mut merged);

        self.cache.store_profile(&merged).await?;
        *self.state.write().await = SessionState::SignedIn(merged.clone());
        Ok(merged)
    }

    pub async fn update_user(&self, input: &UpdateUserInput) -> Result<MutationStatus> {
        self.orchestrator.update_user(input).await
    }

    pub async fn submit_landlord_application(
        &self,
        input: &LandlordApplicationInput,
    ) -> Result<ApplicationStatus> {
        self.orchestrator.submit_landlord_application(input).await
    }

    // ----- Verification / password reset pass-throughs -----
    // None of these mutate `is_authenticated`; they operate on accounts that
    // are not signed in yet or reset credentials out-of-band.

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<MutationStatus> {
        let status = self.orchestrator.verify_email(email, code).await?;
        *self.pending.write().await = None;
        Ok(status)
    }

    pub async fn resend_verification_code(&self, email: &str) -> Result<MutationStatus> {
        self.orchestrator.resend_verification_code(email).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MutationStatus> {
        self.orchestrator.forgot_password(email).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<MutationStatus> {
        self.orchestrator.reset_password(email, code, new_password).await
    }
}
