//! Configuration for the auth core.
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! # Example
//!
//! ```no_run
//! use auth_core::config::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     println!("token endpoint: {}", settings.identity.token_endpoint());
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub identity: IdentitySettings,
    pub backend: BackendSettings,
    pub storage: StorageSettings,
    pub http: HttpSettings,
}

impl Settings {
    /// Load settings from environment variables (and .env in development).
    pub fn from_env() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            identity: IdentitySettings::from_env()?,
            backend: BackendSettings::from_env()?,
            storage: StorageSettings::from_env(),
            http: HttpSettings::from_env()?,
        })
    }
}

/// Identity provider settings (hosted UI + OAuth endpoints)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Base URL of the provider's hosted auth domain
    /// (e.g., "https://auth.kodisha.app")
    pub base_url: String,
    /// OAuth client id registered for the mobile app
    pub client_id: String,
    /// Custom-scheme redirect URI the OS hands back to the app
    pub redirect_uri: String,
    /// Space-separated OAuth scopes
    pub scopes: String,
    /// Post-logout redirect URI for the hosted logout endpoint
    pub logout_redirect_uri: String,
    /// Append `prompt=select_account` so returning users can switch accounts
    pub force_account_picker: bool,
}

impl IdentitySettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env::var("IDP_BASE_URL")
                .context("IDP_BASE_URL must be set")?
                .trim_end_matches('/')
                .to_string(),
            client_id: env::var("IDP_CLIENT_ID").context("IDP_CLIENT_ID must be set")?,
            redirect_uri: env::var("IDP_REDIRECT_URI")
                .unwrap_or_else(|_| "kodisha://auth/callback".to_string()),
            scopes: env::var("IDP_SCOPES")
                .unwrap_or_else(|_| "openid profile email".to_string()),
            logout_redirect_uri: env::var("IDP_LOGOUT_REDIRECT_URI")
                .unwrap_or_else(|_| "kodisha://auth/signout".to_string()),
            force_account_picker: env::var("IDP_FORCE_ACCOUNT_PICKER")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/oauth2/authorize", self.base_url)
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth2/token", self.base_url)
    }

    pub fn revoke_endpoint(&self) -> String {
        format!("{}/oauth2/revoke", self.base_url)
    }

    /// Browser-redirect logout URL for the hosted UI.
    pub fn logout_url(&self) -> String {
        format!(
            "{}/logout?client_id={}&logout_uri={}",
            self.base_url,
            self.client_id,
            urlencoding::encode(&self.logout_redirect_uri)
        )
    }
}

/// Backend GraphQL API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Full URL of the GraphQL endpoint
    pub graphql_url: String,
}

impl BackendSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            graphql_url: env::var("BACKEND_GRAPHQL_URL")
                .context("BACKEND_GRAPHQL_URL must be set")?,
        })
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory for the file-backed session store
    pub dir: String,
}

impl StorageSettings {
    fn from_env() -> Self {
        Self {
            dir: env::var("AUTH_STORAGE_DIR").unwrap_or_else(|_| ".kodisha".to_string()),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Bound on every outbound request (token exchange, profile fetch).
    /// An unbounded hang here would leave the app stuck initializing.
    pub timeout_secs: u64,
}

impl HttpSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid HTTP_TIMEOUT_SECS")?,
        })
    }
}
