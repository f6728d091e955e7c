use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Raw OAuth tokens produced by the provider token endpoint or parsed from
/// a redirect fragment. Held by the bridge for the session lifetime and
/// persisted as a fallback bearer credential until sign-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthTokenSet {
    pub id_token: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Absolute expiry of the access/id tokens
    pub expires_at: Option<DateTime<Utc>>,
}

impl OAuthTokenSet {
    pub fn from_expires_in(
        id_token: String,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        Self {
            id_token,
            access_token,
            refresh_token,
            expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Whether the token set is past (or within `leeway_secs` of) expiry.
    /// A set without a recorded expiry is treated as live; the backend will
    /// reject it if it is not.
    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => at - Duration::seconds(leeway_secs) <= Utc::now(),
            None => false,
        }
    }
}

/// Claims decoded from an identity token payload.
///
/// Produced only by the trusted-channel decode in
/// [`crate::provider::claims::decode_id_token`]; there is no signature
/// verification behind these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub email: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    /// Expiry as a unix timestamp
    pub exp: Option<i64>,
}

impl IdTokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_with_leeway() {
        let set = OAuthTokenSet::from_expires_in("id".into(), "at".into(), None, Some(10));
        assert!(!set.is_expired(0));
        assert!(set.is_expired(30)); // Inside the leeway window

        let no_expiry = OAuthTokenSet::from_expires_in("id".into(), "at".into(), None, None);
        assert!(!no_expiry.is_expired(30));
    }

    #[test]
    fn claims_expiry_conversion() {
        let claims = IdTokenClaims {
            sub: "sub-1".into(),
            email: None,
            given_name: None,
            family_name: None,
            picture: None,
            exp: Some(1_700_000_000),
        };
        assert!(claims.expires_at().is_some());
    }
}
