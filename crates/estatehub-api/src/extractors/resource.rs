//! The collection, action and record a CRUD request was authorized for.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use estatehub_auth::access::Action;
use estatehub_core::error::AppError;
use estatehub_entity::resource::ResourceKind;

use crate::error::ApiError;

/// Set by [`crate::middleware::access::enforce_access`] once both gates pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTarget {
    /// Resolved collection.
    pub kind: ResourceKind,
    /// Requested operation.
    pub action: Action,
    /// Record id for single-record routes.
    pub id: Option<i64>,
}

impl ResourceTarget {
    /// The record id, for routes that address one record.
    pub fn record_id(&self) -> Result<i64, ApiError> {
        self.id.ok_or_else(|| {
            AppError::internal(format!("{} on {} has no record id", self.action, self.kind)).into()
        })
    }
}

impl<S> FromRequestParts<S> for ResourceTarget
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ResourceTarget>()
            .copied()
            .ok_or_else(|| AppError::internal("Route is not behind the access middleware").into())
    }
}
