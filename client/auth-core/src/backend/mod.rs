//! Backend GraphQL client.
//!
//! Consumes the documented operations of the Kodisha API: account
//! provisioning, the authoritative profile, verification and password-reset
//! mutations. Every mutation response is checked for `success`; a falsy
//! value is a domain-level failure even on HTTP 200.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::BackendSettings;
use crate::error::{AuthError, Result};
use crate::models::{LandlordApplicationInput, SignUpInput, UpdateUserInput, UserProfile};

/// `{success, message}` envelope every backend mutation resolves to.
#[derive(Debug, Clone, Deserialize)]
pub struct MutationStatus {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Envelope for the landlord application mutation, which additionally
/// reports the review status.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationStatus {
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

const SIGN_UP: &str = "mutation SignUp($input: SignUpInput!) { signUp(input: $input) { success message } }";
const GET_ME: &str = "query GetMe { me { email firstName lastName phoneNumber businessName profileImage locale currency emailNotifications pushNotifications userType verificationStatus } }";
const VERIFY_EMAIL: &str = "mutation VerifyEmail($email: String!, $code: String!) { verifyEmail(email: $email, code: $code) { success message } }";
const RESEND_VERIFICATION_CODE: &str = "mutation ResendVerificationCode($email: String!) { resendVerificationCode(email: $email) { success message } }";
const FORGOT_PASSWORD: &str = "mutation ForgotPassword($email: String!) { forgotPassword(email: $email) { success message } }";
const RESET_PASSWORD: &str = "mutation ResetPassword($email: String!, $code: String!, $newPassword: String!) { resetPassword(email: $email, code: $code, newPassword: $newPassword) { success message } }";
const UPDATE_USER: &str = "mutation UpdateUser($input: UpdateUserInput!) { updateUser(input: $input) { success message } }";
const SUBMIT_LANDLORD_APPLICATION: &str = "mutation SubmitLandlordApplication($input: LandlordApplicationInput!) { submitLandlordApplication(input: $input) { success status message } }";

/// GraphQL-over-HTTP client for the Kodisha backend.
#[derive(Clone)]
pub struct BackendClient {
    settings: BackendSettings,
    http: Client,
}

impl BackendClient {
    pub fn new(settings: BackendSettings, http: Client) -> Self {
        Self { settings, http }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
        bearer: Option<&str>,
    ) -> Result<T> {
        let mut request = self
            .http
            .post(&self.settings.graphql_url)
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Backend request failed");
            return Err(AuthError::Transport(format!(
                "backend request failed ({}): {}",
                status, body
            )));
        }

        let envelope: GraphQlResponse<T> = response.json().await?;
        if let Some(first) = envelope.errors.first() {
            debug!(message = %first.message, "Backend returned GraphQL errors");
            return Err(AuthError::BackendRejected(first.message.clone()));
        }
        envelope
            .data
            .ok_or_else(|| AuthError::Unknown("backend response carried no data".to_string()))
    }

    fn check(status: MutationStatus) -> Result<MutationStatus> {
        if status.success {
            Ok(status)
        } else {
            Err(AuthError::BackendRejected(
                status
                    .message
                    .unwrap_or_else(|| "Request rejected by the backend".to_string()),
            ))
        }
    }

    /// Provision the account in both the identity provider and the user
    /// table, atomically from the client's point of view.
    pub async fn sign_up(&self, input: &SignUpInput) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "signUp")]
            sign_up: MutationStatus,
        }
        let data: Data = self
            .execute(SIGN_UP, json!({ "input": input }), None)
            .await?;
        Self::check(data.sign_up)
    }

    /// The authoritative profile. Always a network fetch; the backend is the
    /// single source of truth for fields that change out-of-band.
    pub async fn get_me(&self, bearer: &str) -> Result<UserProfile> {
        #[derive(Deserialize)]
        struct Data {
            me: UserProfile,
        }
        let data: Data = self.execute(GET_ME, json!({}), Some(bearer)).await?;
        Ok(data.me)
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "verifyEmail")]
            verify_email: MutationStatus,
        }
        let data: Data = self
            .execute(VERIFY_EMAIL, json!({ "email": email, "code": code }), None)
            .await?;
        Self::check(data.verify_email)
    }

    pub async fn resend_verification_code(&self, email: &str) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "resendVerificationCode")]
            resend: MutationStatus,
        }
        let data: Data = self
            .execute(RESEND_VERIFICATION_CODE, json!({ "email": email }), None)
            .await?;
        Self::check(data.resend)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "forgotPassword")]
            forgot: MutationStatus,
        }
        let data: Data = self
            .execute(FORGOT_PASSWORD, json!({ "email": email }), None)
            .await?;
        Self::check(data.forgot)
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "resetPassword")]
            reset: MutationStatus,
        }
        let data: Data = self
            .execute(
                RESET_PASSWORD,
                json!({ "email": email, "code": code, "newPassword": new_password }),
                None,
            )
            .await?;
        Self::check(data.reset)
    }

    pub async fn update_user(
        &self,
        input: &UpdateUserInput,
        bearer: &str,
    ) -> Result<MutationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "updateUser")]
            update: MutationStatus,
        }
        let data: Data = self
            .execute(UPDATE_USER, json!({ "input": input }), Some(bearer))
            .await?;
        Self::check(data.update)
    }

    pub async fn submit_landlord_application(
        &self,
        input: &LandlordApplicationInput,
        bearer: &str,
    ) -> Result<ApplicationStatus> {
        #[derive(Deserialize)]
        struct Data {
            #[serde(rename = "submitLandlordApplication")]
            submit: ApplicationStatus,
        }
        let data: Data = self
            .execute(
                SUBMIT_LANDLORD_APPLICATION,
                json!({ "input": input }),
                Some(bearer),
            )
            .await?;
        if data.submit.success {
            Ok(data.submit)
        } else {
            Err(AuthError::BackendRejected(
                data.submit
                    .message
                    .unwrap_or_else(|| "Application rejected by the backend".to_string()),
            ))
        }
    }
}
