//! Resource resolution and role/owner gates for the generic CRUD routes.

use std::collections::HashMap;

use axum::extract::{MatchedPath, Path, Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;

use estatehub_auth::access::Action;
use estatehub_core::error::AppError;
use estatehub_core::result::AppResult;

use crate::error::ApiError;
use crate::extractors::{AuthUser, ResourceTarget};
use crate::state::AppState;

/// Resolve `{resource}`, derive the action, and run the access guard.
///
/// Must sit inside [`super::auth::require_auth`]. Unknown collections are
/// rejected before any store lookup.
pub async fn enforce_access(
    State(state): State<AppState>,
    auth: AuthUser,
    matched: MatchedPath,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let name = params
        .get("resource")
        .ok_or_else(|| AppError::internal("Route has no {resource} segment"))?;
    let kind = state.access_guard.resolve(name)?;

    let id = params.get("id").map(|raw| parse_id(raw)).transpose()?;
    let action = action_for(request.method(), matched.as_str(), id.is_some())?;

    state
        .access_guard
        .authorize(auth.claims(), kind, action, id)
        .await?;

    request
        .extensions_mut()
        .insert(ResourceTarget { kind, action, id });
    Ok(next.run(request).await)
}

fn parse_id(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::validation(format!("Invalid record id '{raw}'")))
}

/// Map an HTTP method and matched route to a CRUD action.
pub fn action_for(method: &Method, route: &str, has_id: bool) -> AppResult<Action> {
    let action = match (method, has_id) {
        (&Method::GET, false) if route.ends_with("/my") => Action::ListOwned,
        (&Method::GET, false) => Action::List,
        (&Method::POST, false) => Action::Create,
        (&Method::GET, true) => Action::Read,
        (&Method::PUT, true) => Action::Update,
        (&Method::DELETE, true) => Action::Delete,
        _ => {
            return Err(AppError::internal(format!(
                "No action for {method} {route}"
            )));
        }
    };
    Ok(action)
}
