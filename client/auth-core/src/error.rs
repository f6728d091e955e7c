use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the authentication core.
///
/// Every variant carries a stable machine-checkable discriminator via
/// [`AuthError::kind`]. Callers branch on the kind, never on message text;
/// messages exist for display and logging only.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not confirmed: {email}")]
    AccountNotConfirmed { email: String },

    /// The identity provider demanded a step this core does not model
    /// (MFA, forced password reset). The raw challenge identifier is kept
    /// for diagnostic logging only.
    #[error("Additional challenge required: {challenge}")]
    AdditionalChallengeRequired { challenge: String },

    #[error("Social sign-in cancelled by user")]
    SocialFlowCancelled,

    #[error("Transport failure: {0}")]
    Transport(String),

    /// A backend mutation returned `success: false`. Carries the backend
    /// message verbatim for display.
    #[error("{0}")]
    BackendRejected(String),

    #[error("Operation already in flight")]
    OperationInFlight,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Stable discriminator for control flow and telemetry.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::AccountNotConfirmed { .. } => "account_not_confirmed",
            AuthError::AdditionalChallengeRequired { .. } => "additional_challenge_required",
            AuthError::SocialFlowCancelled => "social_flow_cancelled",
            AuthError::Transport(_) => "transport_failure",
            AuthError::BackendRejected(_) => "backend_rejected",
            AuthError::OperationInFlight => "operation_in_flight",
            AuthError::Storage(_) => "storage",
            AuthError::Configuration(_) => "configuration",
            AuthError::Validation(_) => "validation",
            AuthError::Unknown(_) => "unknown",
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("HTTP transport error: {}", err);
        AuthError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("Serialization error: {}", err);
        AuthError::Unknown(format!("serialization: {}", err))
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(err: url::ParseError) -> Self {
        AuthError::Unknown(format!("url parse: {}", err))
    }
}
