/// Kodisha Auth Core
///
/// Hybrid authentication and session-bridging layer for the Kodisha client:
/// coordinates the managed identity provider, the backend GraphQL API, and
/// local session persistence behind one stateful context.
///
/// ## Modules
///
/// - `backend`: GraphQL client for account and profile operations
/// - `config`: Settings loaded from the environment
/// - `context`: Application auth context (state machine, persistence sync)
/// - `error`: Error taxonomy with stable discriminators
/// - `models`: Profiles, tokens, request inputs
/// - `orchestrator`: Dual-path sign-up/sign-in orchestration
/// - `provider`: Identity provider bridge (password grant, hosted-UI flows)
/// - `store`: Durable key-value session store
/// - `validators`: Input validation
pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod provider;
pub mod store;
pub mod validators;

// Re-export commonly used types
pub use context::{AuthContext, SessionState};
pub use error::{AuthError, Result};
pub use models::{PendingVerification, SignUpInput, UserProfile, UserType};
pub use orchestrator::{AuthOrchestrator, AuthOutcome};
pub use provider::{BrowserFlow, BrowserOutcome, ProviderBridge, SocialProvider};
pub use store::{FileSessionStore, MemorySessionStore, SessionCache, SessionStore};
