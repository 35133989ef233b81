//! Route policy table: which roles may perform which action on which collection.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use estatehub_entity::resource::ResourceKind;
use estatehub_entity::user::UserRole;

/// An operation exposed by the generic CRUD routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// `GET /api/{resource}`
    List,
    /// `GET /api/{resource}/my`
    ListOwned,
    /// `GET /api/{resource}/{id}`
    Read,
    /// `POST /api/{resource}`
    Create,
    /// `PUT /api/{resource}/{id}`
    Update,
    /// `DELETE /api/{resource}/{id}`
    Delete,
}

impl Action {
    /// Every action.
    pub const ALL: [Action; 6] = [
        Self::List,
        Self::ListOwned,
        Self::Read,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::ListOwned => "list_owned",
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Gates applied to one (collection, action) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    /// Roles that pass the role-gate. Empty means nobody.
    pub roles: Vec<UserRole>,
    /// Whether the record's owner must also be checked.
    pub owner_gate: bool,
}

impl AccessRule {
    fn new(roles: &[UserRole], owner_gate: bool) -> Self {
        Self {
            roles: roles.to_vec(),
            owner_gate,
        }
    }

    fn deny() -> Self {
        Self::new(&[], false)
    }

    /// Whether the role passes the role-gate.
    pub fn allows(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }
}

/// Maps every (collection, action) pair to its [`AccessRule`].
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: HashMap<(ResourceKind, Action), AccessRule>,
}

impl AccessPolicy {
    /// Creates the default policy table.
    pub fn new() -> Self {
        const ANY: &[UserRole] = &UserRole::ALL;
        const STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Agent];
        const ADMIN: &[UserRole] = &[UserRole::Admin];

        let mut rules = HashMap::new();

        for kind in [ResourceKind::Property, ResourceKind::Sale, ResourceKind::Purchase] {
            rules.insert((kind, Action::List), AccessRule::new(ANY, false));
            rules.insert((kind, Action::ListOwned), AccessRule::new(ANY, false));
            rules.insert((kind, Action::Read), AccessRule::new(ANY, false));
            rules.insert((kind, Action::Create), AccessRule::new(STAFF, false));
            rules.insert((kind, Action::Update), AccessRule::new(STAFF, true));
            rules.insert((kind, Action::Delete), AccessRule::new(STAFF, true));
        }

        // Accounts are created by registration only.
        let users = ResourceKind::User;
        rules.insert((users, Action::List), AccessRule::new(ADMIN, false));
        rules.insert((users, Action::ListOwned), AccessRule::new(ADMIN, false));
        rules.insert((users, Action::Read), AccessRule::new(ADMIN, false));
        rules.insert((users, Action::Create), AccessRule::deny());
        rules.insert((users, Action::Update), AccessRule::new(ADMIN, false));
        rules.insert((users, Action::Delete), AccessRule::new(ADMIN, false));

        Self { rules }
    }

    /// The rule for a (collection, action) pair. Unlisted pairs deny everyone.
    pub fn rule(&self, kind: ResourceKind, action: Action) -> AccessRule {
        self.rules
            .get(&(kind, action))
            .cloned()
            .unwrap_or_else(AccessRule::deny)
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_has_a_rule() {
        let policy = AccessPolicy::new();
        for kind in ResourceKind::ALL {
            for action in Action::ALL {
                assert!(policy.rules.contains_key(&(kind, action)), "{kind} {action}");
            }
        }
    }

    #[test]
    fn test_listing_rules() {
        let policy = AccessPolicy::new();
        let read = policy.rule(ResourceKind::Property, Action::Read);
        assert!(read.allows(UserRole::User));
        assert!(!read.owner_gate);

        let create = policy.rule(ResourceKind::Sale, Action::Create);
        assert!(create.allows(UserRole::Agent));
        assert!(!create.allows(UserRole::User));

        let delete = policy.rule(ResourceKind::Purchase, Action::Delete);
        assert!(delete.allows(UserRole::Admin));
        assert!(delete.owner_gate);
    }

    #[test]
    fn test_user_rules_are_admin_only() {
        let policy = AccessPolicy::new();
        for action in Action::ALL {
            let rule = policy.rule(ResourceKind::User, action);
            assert!(!rule.allows(UserRole::Agent));
            assert!(!rule.allows(UserRole::User));
        }
        assert!(!policy.rule(ResourceKind::User, Action::Create).allows(UserRole::Admin));
        assert!(policy.rule(ResourceKind::User, Action::Update).allows(UserRole::Admin));
    }
}
