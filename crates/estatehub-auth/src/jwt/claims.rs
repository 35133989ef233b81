//! JWT claims payload shared by access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use estatehub_entity::user::UserRole;

/// Token payload.
///
/// Access tokens carry a `role` and no `jti`; refresh tokens carry a `jti`
/// and no `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account the token was issued to.
    pub user_id: i64,
    /// Role at issuance time. Absent on refresh tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Unique token id. Present only on refresh tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Whether these are refresh-token claims.
    pub fn is_refresh(&self) -> bool {
        self.jti.is_some() && self.role.is_none()
    }

    /// Whether these are access-token claims.
    pub fn is_access(&self) -> bool {
        self.role.is_some() && self.jti.is_none()
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
