//! Generic CRUD handlers for `/api/{resource}`.
//!
//! Every handler runs behind the auth and access middleware; the resolved
//! collection and record id arrive through [`ResourceTarget`].

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::Value;

use estatehub_entity::resource::ResourceRecord;

use crate::dto::response::MessageResponse;
use crate::error::ApiError;
use crate::extractors::{ApiJson, AuthUser, ResourceTarget};
use crate::state::AppState;

/// GET /api/{resource}
pub async fn list(
    State(state): State<AppState>,
    target: ResourceTarget,
) -> Result<Json<Vec<ResourceRecord>>, ApiError> {
    Ok(Json(state.resources.list(target.kind).await?))
}

/// GET /api/{resource}/my
pub async fn list_owned(
    State(state): State<AppState>,
    auth: AuthUser,
    target: ResourceTarget,
) -> Result<Json<Vec<ResourceRecord>>, ApiError> {
    Ok(Json(
        state.resources.list_owned(target.kind, auth.user_id).await?,
    ))
}

/// GET /api/{resource}/{id}
pub async fn read(
    State(state): State<AppState>,
    target: ResourceTarget,
) -> Result<Json<ResourceRecord>, ApiError> {
    let id = target.record_id()?;
    Ok(Json(state.resources.find(target.kind, id).await?))
}

/// POST /api/{resource}
///
/// The record is stamped with the caller as owner.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    target: ResourceTarget,
    ApiJson(body): ApiJson<Value>,
) -> Result<(StatusCode, Json<ResourceRecord>), ApiError> {
    let payload = target.kind.parse_payload(body)?;
    let record = state.resources.insert(&payload, auth.user_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        resource = %target.kind,
        record_id = record.id(),
        "Record created"
    );
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/{resource}/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    target: ResourceTarget,
    ApiJson(body): ApiJson<Value>,
) -> Result<Json<ResourceRecord>, ApiError> {
    let id = target.record_id()?;
    let payload = target.kind.parse_payload(body)?;
    let record = state.resources.update(id, &payload).await?;

    tracing::info!(
        user_id = auth.user_id,
        resource = %target.kind,
        record_id = id,
        "Record updated"
    );
    Ok(Json(record))
}

/// DELETE /api/{resource}/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    target: ResourceTarget,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = target.record_id()?;
    state.resources.delete(target.kind, id).await?;

    tracing::info!(
        user_id = auth.user_id,
        resource = %target.kind,
        record_id = id,
        "Record deleted"
    );
    Ok(Json(MessageResponse {
        message: format!("{} record {id} deleted", target.kind),
    }))
}
