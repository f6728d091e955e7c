use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::models::{OAuthTokenSet, UserProfile};
use crate::store::SessionStore;

const USER_KEY: &str = "auth:user";
const ID_TOKEN_KEY: &str = "auth:id_token";
const ACCESS_TOKEN_KEY: &str = "auth:access_token";
const REFRESH_TOKEN_KEY: &str = "auth:refresh_token";

/// Typed wrapper over the session store with the fixed key layout:
/// one key for the serialized profile, separate keys for the raw OAuth
/// tokens used as a fallback bearer credential path.
///
/// Write policy: the primary profile write propagates failure; the token
/// writes are a best-effort side channel (logged and swallowed), since
/// losing them only costs the fallback credential path.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Persist the profile. Failure propagates: a sign-in that cannot
    /// record its profile must not report success.
    pub async fn store_profile(&self, profile: &UserProfile) -> Result<()> {
        let json = serde_json::to_string(profile)?;
        self.store.set(USER_KEY, &json).await
    }

    /// Load the cached profile. Absent or malformed content reads as `None`.
    pub async fn load_profile(&self) -> Option<UserProfile> {
        let raw = match self.store.get(USER_KEY).await {
            Ok(v) => v?,
            Err(e) => {
                warn!(error = %e, "Profile cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, "Cached profile is malformed, ignoring");
                None
            }
        }
    }

    /// Best-effort persistence of the raw tokens.
    pub async fn store_tokens(&self, tokens: &OAuthTokenSet) {
        if let Err(e) = self.store.set(ID_TOKEN_KEY, &tokens.id_token).await {
            warn!(error = %e, "Best-effort id token write failed");
        }
        if let Err(e) = self.store.set(ACCESS_TOKEN_KEY, &tokens.access_token).await {
            warn!(error = %e, "Best-effort access token write failed");
        }
        if let Some(refresh) = &tokens.refresh_token {
            if let Err(e) = self.store.set(REFRESH_TOKEN_KEY, refresh).await {
                warn!(error = %e, "Best-effort refresh token write failed");
            }
        }
    }

    /// Load raw tokens persisted by an earlier session, if both are present.
    pub async fn load_tokens(&self) -> Option<(String, String, Option<String>)> {
        let id_token = self.store.get(ID_TOKEN_KEY).await.ok().flatten()?;
        let access_token = self.store.get(ACCESS_TOKEN_KEY).await.ok().flatten()?;
        let refresh_token = self.store.get(REFRESH_TOKEN_KEY).await.ok().flatten();
        Some((id_token, access_token, refresh_token))
    }

    /// Fallback bearer credential when no live session token is available.
    pub async fn fallback_bearer(&self) -> Option<String> {
        self.store.get(ID_TOKEN_KEY).await.ok().flatten()
    }

    /// Clear everything this core ever persists. Best-effort: sign-out must
    /// land signed-out locally even when the store misbehaves.
    pub async fn clear(&self) {
        for key in [USER_KEY, ID_TOKEN_KEY, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key = %key, error = %e, "Session cache clear failed");
            }
        }
    }
}
