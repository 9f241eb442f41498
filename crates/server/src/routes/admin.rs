use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use service::errors::ServiceError;
use tracing::warn;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiKeyRecord {
    pub user: String,
    pub api_key: String,
}

#[utoipa::path(get, path = "/admin/api-keys", tag = "admin", responses((status = 200, description = "OK")))]
pub async fn list_api_keys(State(state): State<AppState>) -> Json<Value> {
    let keys = state
        .admin_store
        .list()
        .await
        .into_iter()
        .map(|(user, api_key)| ApiKeyRecord { user, api_key })
        .collect::<Vec<_>>();
    Json(json!({"success": true, "keys": keys}))
}

#[utoipa::path(
    post,
    path = "/admin/api-keys",
    tag = "admin",
    request_body = crate::openapi::ApiKeyRecordDoc,
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request"))
)]
pub async fn set_api_key(
    State(state): State<AppState>,
    payload: Result<Json<ApiKeyRecord>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    state.admin_store.set(payload.user, payload.api_key).await?;
    Ok(Json(json!({"success": true, "message": "API key saved"})))
}

#[utoipa::path(
    delete,
    path = "/admin/api-keys/{user}",
    tag = "admin",
    params(("user" = String, Path, description = "Key owner")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Unknown user"))
)]
pub async fn delete_api_key(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    if !state.admin_store.delete(&user).await? {
        return Err(ServiceError::not_found("api key").into());
    }
    Ok(Json(json!({"success": true, "message": "API key deleted"})))
}

fn presented_key(req: &Request) -> Option<String> {
    if let Some(key) = req.headers().get("X-API-Key").and_then(|v| v.to_str().ok()) {
        return Some(key.to_string());
    }
    // fallback to query param
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(req.uri()).ok()?;
    params.get("api_key").filter(|v| !v.is_empty()).cloned()
}

/// Middleware: when key checks are enabled, require a stored X-API-Key (or
/// query `api_key`). Admin routes stay open until the first key exists.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if !state.require_api_key {
        return Ok(next.run(req).await);
    }
    if req.uri().path().starts_with("/admin/") && state.admin_store.is_empty().await {
        return Ok(next.run(req).await);
    }
    match presented_key(&req) {
        Some(key) if state.admin_store.contains_value(&key).await => Ok(next.run(req).await),
        Some(_) => {
            warn!(path = %req.uri().path(), event = "api_key_rejected", "unknown api key");
            Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Invalid API key"))
        }
        None => Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Missing API key")),
    }
}
