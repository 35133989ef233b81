//! Route definitions for the EstateHub HTTP API.
//!
//! Auth endpoints live under `/api/auth`; every other `/api/{resource}`
//! route goes through authentication, then the access middleware.

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and per-route middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(auth_routes(&state))
        .merge(resource_routes(&state))
        .layer(from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Register, login, refresh (public) and me (authenticated).
fn auth_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh));

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    public.merge(protected)
}

/// Generic CRUD over the allow-listed collections.
fn resource_routes(state: &AppState) -> Router<AppState> {
    use handlers::resource;

    Router::new()
        .route("/api/{resource}", get(resource::list).post(resource::create))
        .route("/api/{resource}/my", get(resource::list_owned))
        .route(
            "/api/{resource}/{id}",
            get(resource::read)
                .put(resource::update)
                .delete(resource::delete),
        )
        // Layers run outermost-last: authentication, then access.
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::access::enforce_access,
        ))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ))
}
