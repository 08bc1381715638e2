//! Session credential verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Claims carried by a backend-issued session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id as signed by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Standard subject claim, used when `id` is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Role claim, `"admin"` unlocks the admin scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Expiration time (UNIX timestamp)
    pub exp: i64,

    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Everything else the backend put in the token
    #[serde(flatten)]
    pub additional: serde_json::Map<String, serde_json::Value>,
}

impl SessionClaims {
    pub fn user_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the role claim matches `admin_role` exactly.
    pub fn has_role(&self, admin_role: &str) -> bool {
        self.role.as_deref() == Some(admin_role)
    }
}

/// Verifies HMAC-signed session tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = leeway_secs;
        validation.validate_nbf = true;
        // The backend does not set an audience.
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature, structure and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}


#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;

    #[test]
    fn test_verify_valid_token() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let claims = verifier.verify(&token_for("user", 3600)).unwrap();
        assert_eq!(claims.role.as_deref(), Some("user"));
        assert_eq!(claims.user_id(), Some("64f1c2a9e13b"));
        assert!(!claims.has_role("admin"));
        assert!(claims.expires_at().unwrap() > chrono::Utc::now());
    }

    #[test]
    fn test_verify_admin_role() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let claims = verifier.verify(&token_for("admin", 3600)).unwrap();
        assert!(claims.has_role("admin"));
    }

    #[test]
    fn test_sub_is_accepted_as_id() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(serde_json::json!({ "sub": "u-1", "exp": now() + 60, "plan": "pro" }));
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id(), Some("u-1"));
        assert_eq!(claims.role, None);
        assert_eq!(claims.additional.get("plan"), Some(&serde_json::json!("pro")));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let err = verifier.verify(&token_for("admin", -3600)).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn test_leeway_tolerates_small_skew() {
        let verifier = TokenVerifier::new(SECRET, 120);
        assert!(verifier.verify(&token_for("user", -30)).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign_with(
            serde_json::json!({ "role": "admin", "exp": now() + 3600 }),
            "someone-elses-secret",
        );
        assert_eq!(verifier.verify(&token).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn test_missing_exp_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = sign(serde_json::json!({ "role": "admin" }));
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        assert!(matches!(verifier.verify("not-a-jwt"), Err(TokenError::Malformed(_))));
        assert!(verifier.verify("").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let verifier = TokenVerifier::new(SECRET, 0);
        let token = token_for("user", 3600);
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = sign(serde_json::json!({ "role": "admin", "exp": now() + 3600 }));
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");
        assert_eq!(verifier.verify(&tampered).unwrap_err(), TokenError::InvalidSignature);
    }
}
