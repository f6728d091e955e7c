//! Shared fixtures: mock identity provider + backend, in-memory store,
//! fully wired auth context.
#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_core::config::{BackendSettings, IdentitySettings};
use auth_core::orchestrator::AuthOrchestrator;
use auth_core::provider::token::{CodeExchange, TokenAcquisition};
use auth_core::{
    AuthContext, AuthError, BrowserFlow, BrowserOutcome, MemorySessionStore, ProviderBridge,
    SessionCache, SessionStore,
};
use auth_core::backend::BackendClient;

static TRACING: Once = Once::new();

/// Route crate logs through the test writer; filter with `RUST_LOG`.
fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

pub struct Harness {
    pub idp: MockServer,
    pub backend: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub ctx: AuthContext,
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(false).await
    }

    pub async fn with_code_exchange() -> Self {
        Self::build(true).await
    }

    async fn build(code_exchange: bool) -> Self {
        init_tracing();
        let idp = MockServer::start().await;
        let backend = MockServer::start().await;
        let store = Arc::new(MemorySessionStore::new());

        let identity = identity_settings(&idp.uri());
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        let cache = SessionCache::new(store.clone() as Arc<dyn SessionStore>);
        let mut bridge = ProviderBridge::new(identity.clone(), http.clone(), cache.clone());
        if code_exchange {
            let strategy: Arc<dyn TokenAcquisition> =
                Arc::new(CodeExchange::new(identity, http.clone()));
            bridge = bridge.with_acquisition(strategy);
        }

        let backend_client = BackendClient::new(
            BackendSettings {
                graphql_url: format!("{}/graphql", backend.uri()),
            },
            http,
        );
        let orchestrator =
            AuthOrchestrator::new(Arc::new(bridge), backend_client, cache.clone());
        let ctx = AuthContext::from_parts(orchestrator, cache);

        Self {
            idp,
            backend,
            store,
            ctx,
        }
    }
}

pub fn identity_settings(base_url: &str) -> IdentitySettings {
    IdentitySettings {
        base_url: base_url.trim_end_matches('/').to_string(),
        client_id: "client-123".to_string(),
        redirect_uri: "kodisha://auth/callback".to_string(),
        scopes: "openid profile email".to_string(),
        logout_redirect_uri: "kodisha://auth/signout".to_string(),
        force_account_picker: false,
    }
}

/// Unsigned JWT with a decodable payload, standing in for a provider-issued
/// id token.
pub fn make_id_token(email: &str, exp: i64) -> String {
    let seg = |v: &serde_json::Value| BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(v).unwrap());
    format!(
        "{}.{}.signature",
        seg(&json!({"alg": "RS256", "typ": "JWT"})),
        seg(&json!({"sub": "sub-1", "email": email, "exp": exp}))
    )
}

pub fn future_exp() -> i64 {
    chrono::Utc::now().timestamp() + 3600
}

pub fn profile_json(first_name: &str) -> serde_json::Value {
    json!({
        "email": "a@x.com",
        "firstName": first_name,
        "lastName": "B",
        "phoneNumber": "+255700000000",
        "businessName": null,
        "profileImage": null,
        "locale": "sw-TZ",
        "currency": "TZS",
        "emailNotifications": true,
        "pushNotifications": false,
        "userType": "tenant",
        "verificationStatus": "verified"
    })
}

/// Mount a successful password/code grant on the provider token endpoint.
pub async fn mount_token_success(idp: &MockServer, email: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "id_token": make_id_token(email, future_exp()),
            "refresh_token": "refresh-1",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(idp)
        .await;
}

pub async fn mount_token_error(idp: &MockServer, status: u16, error_code: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "error": error_code,
            "error_description": "display only"
        })))
        .mount(idp)
        .await;
}

/// Mount a `getMe` response; operations are matched on the document name.
pub async fn mount_get_me(backend: &MockServer, first_name: &str) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("GetMe"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "data": { "me": profile_json(first_name) }
            })),
        )
        .mount(backend)
        .await;
}

pub async fn mount_revoke(idp: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .mount(idp)
        .await;
}

/// Browser stand-in: either completes the redirect or reports dismissal.
pub enum FakeBrowser {
    /// Echo the state back in a fragment-style token response.
    FragmentTokens { id_token: String },
    /// Echo the state back in a query-string code response.
    CodeRedirect { code: String },
    Dismissed,
}

#[async_trait::async_trait]
impl BrowserFlow for FakeBrowser {
    async fn authorize(&self, url: &str) -> auth_core::Result<BrowserOutcome> {
        let authorize = Url::parse(url).map_err(|e| AuthError::Unknown(e.to_string()))?;
        let state = authorize
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let redirect = match self {
            FakeBrowser::FragmentTokens { id_token } => format!(
                "kodisha://auth/callback#access_token=access-1&id_token={}&expires_in=3600&state={}",
                id_token, state
            ),
            FakeBrowser::CodeRedirect { code } => {
                format!("kodisha://auth/callback?code={}&state={}", code, state)
            }
            FakeBrowser::Dismissed => return Ok(BrowserOutcome::Cancelled),
        };
        Ok(BrowserOutcome::Redirect(Url::parse(&redirect).unwrap()))
    }
}
