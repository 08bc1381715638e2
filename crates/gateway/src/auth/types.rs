use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claims::SessionClaims;

/// Header carrying the verified user id to the page renderer
pub const USER_ID_HEADER: &str = "x-subtracker-user-id";
/// Header carrying the verified role claim to the page renderer
pub const USER_ROLE_HEADER: &str = "x-subtracker-role";

/// User context extracted from a verified session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&SessionClaims> for UserContext {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.user_id().map(str::to_string),
            role: claims.role.clone(),
            expires_at: claims.expires_at(),
        }
    }
}
