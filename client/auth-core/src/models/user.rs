use serde::{Deserialize, Serialize};
use validator::Validate;

/// Account type matching the backend user_type field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Tenant,
    Landlord,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Tenant => "tenant",
            UserType::Landlord => "landlord",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "tenant" => Some(UserType::Tenant),
            "landlord" => Some(UserType::Landlord),
            _ => None,
        }
    }
}

/// Account verification status, owned by the backend (changes out-of-band,
/// e.g., admin approval of a landlord application)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Pending,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Unverified => "unverified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
        }
    }
}

/// The authoritative account record, fetched from the backend and never
/// locally computed. The client holds a cached copy whose lifetime matches
/// the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    // Profile fields
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub locale: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub push_notifications: bool,
    // Account metadata
    pub user_type: UserType,
    pub verification_status: VerificationStatus,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_landlord(&self) -> bool {
        self.user_type == UserType::Landlord
    }
}

/// Optimistic partial update to the cached profile. Fields not present in
/// the patch are preserved; backend truth wins on the next refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub locale: Option<String>,
    pub currency: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}

impl UserProfilePatch {
    /// Merge the patch into a profile, preserving unpatched fields.
    pub fn merge_into(&self, profile: &mut UserProfile) {
        if let Some(v) = &self.first_name {
            profile.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            profile.last_name = v.clone();
        }
        if let Some(v) = &self.phone_number {
            profile.phone_number = Some(v.clone());
        }
        if let Some(v) = &self.business_name {
            profile.business_name = Some(v.clone());
        }
        if let Some(v) = &self.profile_image {
            profile.profile_image = Some(v.clone());
        }
        if let Some(v) = &self.locale {
            profile.locale = Some(v.clone());
        }
        if let Some(v) = &self.currency {
            profile.currency = Some(v.clone());
        }
        if let Some(v) = self.email_notifications {
            profile.email_notifications = v;
        }
        if let Some(v) = self.push_notifications {
            profile.push_notifications = v;
        }
    }
}

/// Sign-up request sent to the backend `signUp` mutation
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[validate(email)]
    pub email: String,
    #[validate(
        length(min = 8, max = 128),
        custom(function = "crate::validators::validate_password_validator")
    )]
    pub password: String,
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(min = 1, max = 64))]
    pub last_name: String,
    #[validate(custom(function = "crate::validators::validate_phone_validator"))]
    pub phone_number: String,
    pub user_type: Option<UserType>,
}

/// Profile update request for the backend `updateUser` mutation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[validate(length(min = 1, max = 64))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub business_name: Option<String>,
    pub profile_image: Option<String>,
    pub locale: Option<String>,
    pub currency: Option<String>,
    pub email_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}

/// Landlord application submitted through the backend
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LandlordApplicationInput {
    #[validate(length(min = 1, max = 128))]
    pub business_name: String,
    #[validate(length(min = 1, max = 2048))]
    pub description: String,
    #[validate(custom(function = "crate::validators::validate_phone_validator"))]
    pub contact_phone: String,
}

/// Transient verification state threaded between sign-up/sign-in and the
/// verification flow. Never persisted; discarded on success or dismissal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn profile() -> UserProfile {
        UserProfile {
            email: "a@x.com".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            phone_number: Some("+255700000000".into()),
            business_name: None,
            profile_image: None,
            locale: Some("sw-TZ".into()),
            currency: Some("TZS".into()),
            email_notifications: true,
            push_notifications: false,
            user_type: UserType::Tenant,
            verification_status: VerificationStatus::Unverified,
        }
    }

    #[test]
    fn patch_preserves_unpatched_fields() {
        let mut p = profile();
        let patch = UserProfilePatch {
            first_name: Some("Amina".into()),
            ..Default::default()
        };
        patch.merge_into(&mut p);

        assert_eq!(p.first_name, "Amina");
        assert_eq!(p.last_name, "B");
        assert_eq!(p.currency.as_deref(), Some("TZS"));
        assert!(p.email_notifications);
    }

    #[test]
    fn sign_up_input_validation() {
        let input = SignUpInput {
            email: "a@x.com".into(),
            password: "longenough1".into(),
            first_name: "A".into(),
            last_name: "B".into(),
            phone_number: "+255700000000".into(),
            user_type: None,
        };
        assert!(input.validate().is_ok());

        let bad = SignUpInput {
            phone_number: "0700000000".into(),
            ..input
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn profile_serializes_camel_case() {
        let json = serde_json::to_string(&profile()).unwrap();
        assert!(json.contains("firstName"));
        assert!(json.contains("userType"));
        assert!(json.contains("verificationStatus"));
    }
}
