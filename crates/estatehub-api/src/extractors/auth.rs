//! `AuthUser` extractor: hands validated claims to handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use estatehub_auth::jwt::Claims;
use estatehub_core::error::AppError;

use crate::error::ApiError;

/// Validated claims, inserted into request extensions by
/// [`crate::middleware::auth::require_auth`].
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Claims of the presented access token.
    pub claims: Claims,
}

/// Extracted authenticated caller available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the inner claims.
    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Claims;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .map(|ctx| AuthUser(ctx.claims.clone()))
            .ok_or_else(|| AppError::missing_auth("Authentication required").into())
    }
}
