//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::role::UserRole;

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Unique email address, also accepted as a login identifier.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Foreign key into `roles`.
    pub role_id: i32,
    /// Whether the account may log in.
    pub is_active: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Resolve the typed role for this account.
    pub fn role(&self) -> Option<UserRole> {
        UserRole::from_id(self.role_id)
    }

    /// The identity view of this account, if its role id is known.
    pub fn identity(&self) -> Option<Identity> {
        self.role().map(|role| Identity { id: self.id, role })
    }
}

/// The authenticated principal: an account id and its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id.
    pub id: i64,
    /// Role at the time of lookup.
    pub role: UserRole,
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role id.
    pub role_id: i32,
}
