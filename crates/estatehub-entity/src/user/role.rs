//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Roles available in the system.
///
/// Stored in the `roles` table; the numeric ids are fixed by the initial
/// migration (`admin` = 1, `agent` = 2, `user` = 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full administrator. Bypasses ownership checks.
    Admin,
    /// Real-estate agent. May create and manage listings and deals.
    Agent,
    /// Regular registered user. Read-only on shared collections.
    User,
}

impl UserRole {
    /// Every role, in privilege order.
    pub const ALL: [UserRole; 3] = [Self::Admin, Self::Agent, Self::User];

    /// Role assigned to freshly registered accounts.
    pub const DEFAULT: UserRole = Self::User;

    /// Primary key of this role in the `roles` table.
    pub fn id(&self) -> i32 {
        match self {
            Self::Admin => 1,
            Self::Agent => 2,
            Self::User => 3,
        }
    }

    /// Look a role up by its `roles.id`.
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == id)
    }

    /// Check if this role is the top-privilege role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
            Self::User => "user",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
