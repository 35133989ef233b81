//! Bearer-token authentication middleware.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;

use crate::error::ApiError;
use crate::extractors::AuthContext;
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Rejects the request unless it carries a valid access token.
///
/// On success the claims are stored as [`AuthContext`] in the request
/// extensions; downstream handlers read them through `AuthUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = {
        let token = bearer_token(request.headers())?;
        state.jwt_decoder.validate_access_token(token)?
    };

    request.extensions_mut().insert(AuthContext { claims });
    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// The scheme is case-sensitive and separated by exactly one space.
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::missing_auth("Missing Authorization header"))?;

    let value = value
        .to_str()
        .map_err(|_| AppError::malformed_auth("Authorization header is not valid text"))?;

    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AppError::malformed_auth("Expected 'Bearer <token>'"))?;

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::malformed_auth("Expected 'Bearer <token>'"));
    }

    Ok(token)
}
