//! Allow/deny decisions from token claims and record ownership.

use std::sync::Arc;

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;
use estatehub_database::store::ResourceStore;
use estatehub_entity::resource::{ResourceKind, UNOWNED};

use super::policy::{AccessPolicy, Action};
use crate::jwt::Claims;

/// Applies the role-gate and owner-gate for a route.
#[derive(Clone)]
pub struct AccessGuard {
    policy: AccessPolicy,
    store: Arc<dyn ResourceStore>,
}

impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AccessGuard {
    /// Creates a guard over the given policy and ownership store.
    pub fn new(policy: AccessPolicy, store: Arc<dyn ResourceStore>) -> Self {
        Self { policy, store }
    }

    /// Resolve a route segment to a collection. No store access.
    pub fn resolve(&self, name: &str) -> AppResult<ResourceKind> {
        ResourceKind::from_name(name)
    }

    /// Permit iff the token's role is in the route's allow-set.
    ///
    /// Tokens without a role (refresh tokens) never pass.
    pub fn role_gate(&self, claims: &Claims, kind: ResourceKind, action: Action) -> AppResult<()> {
        let role = claims
            .role
            .ok_or_else(|| AppError::forbidden("Token carries no role"))?;

        if self.policy.rule(kind, action).allows(role) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = claims.user_id,
                role = %role,
                resource = %kind,
                action = %action,
                "Role-gate denied"
            );
            Err(AppError::forbidden(format!(
                "Role '{role}' may not {action} {kind}"
            )))
        }
    }

    /// Permit if the caller owns the record, is an admin, or the record is unowned.
    ///
    /// `NotFound` if the record does not exist.
    pub async fn owner_gate(&self, claims: &Claims, kind: ResourceKind, id: i64) -> AppResult<()> {
        let owner_id = self.store.get_owner_id(kind, id).await?;

        let is_admin = claims.role.is_some_and(|role| role.is_admin());
        if owner_id == claims.user_id || owner_id == UNOWNED || is_admin {
            return Ok(());
        }

        tracing::debug!(
            user_id = claims.user_id,
            owner_id,
            resource = %kind,
            record_id = id,
            "Owner-gate denied"
        );
        Err(AppError::forbidden(format!(
            "{kind} record {id} belongs to another account"
        )))
    }

    /// Run the role-gate, then the owner-gate if the route has one.
    pub async fn authorize(
        &self,
        claims: &Claims,
        kind: ResourceKind,
        action: Action,
        record_id: Option<i64>,
    ) -> AppResult<()> {
        self.role_gate(claims, kind, action)?;

        if self.policy.rule(kind, action).owner_gate {
            let id = record_id.ok_or_else(|| {
                AppError::internal(format!("{action} on {kind} requires a record id"))
            })?;
            self.owner_gate(claims, kind, id).await?;
        }

        Ok(())
    }
}
