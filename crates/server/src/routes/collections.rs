use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use service::{
    collections::{CollectionRepository, Record, RecordRepository},
    content_type::ContentType,
    errors::ServiceError,
};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

fn repository(state: &AppState, kind: &str) -> Result<CollectionRepository, JsonApiError> {
    let content_type: ContentType = kind.parse()?;
    Ok(state.collection(content_type)?)
}

#[utoipa::path(
    get,
    path = "/api/collections/{type}",
    tag = "collections",
    params(("type" = String, Path, description = "List content type")),
    responses((status = 200, description = "All records"), (status = 400, description = "Not a list type"))
)]
pub async fn list(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    let records = repository(&state, &kind)?.list().await?;
    Ok(Json(json!({"success": true, "count": records.len(), "records": records})))
}

#[utoipa::path(
    get,
    path = "/api/collections/{type}/published",
    tag = "collections",
    params(("type" = String, Path, description = "List content type")),
    responses((status = 200, description = "Active records in display order"))
)]
pub async fn published(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    let records = repository(&state, &kind)?.published().await?;
    Ok(Json(json!({"success": true, "count": records.len(), "records": records})))
}

#[utoipa::path(
    get,
    path = "/api/collections/{type}/{id}",
    tag = "collections",
    params(("type" = String, Path, description = "List content type"), ("id" = i64, Path, description = "Record id")),
    responses((status = 200, description = "Record"), (status = 404, description = "No such record"))
)]
pub async fn get(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Value>, JsonApiError> {
    let record = repository(&state, &kind)?
        .get(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("record"))?;
    Ok(Json(json!({"success": true, "record": record})))
}

#[utoipa::path(
    post,
    path = "/api/collections/{type}",
    tag = "collections",
    params(("type" = String, Path, description = "List content type")),
    request_body = crate::openapi::RecordDoc,
    responses((status = 200, description = "Stored record with its id"), (status = 400, description = "Bad record"))
)]
pub async fn upsert(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    payload: Result<Json<Record>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(record) = payload?;
    let record = repository(&state, &kind)?.upsert(record).await?;
    Ok(Json(json!({"success": true, "message": "Record saved", "record": record})))
}

#[utoipa::path(
    delete,
    path = "/api/collections/{type}/{id}",
    tag = "collections",
    params(("type" = String, Path, description = "List content type"), ("id" = i64, Path, description = "Record id")),
    responses((status = 200, description = "Removed"), (status = 404, description = "No such record"))
)]
pub async fn remove(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<Value>, JsonApiError> {
    if !repository(&state, &kind)?.remove(id).await? {
        return Err(ServiceError::not_found("record").into());
    }
    Ok(Json(json!({"success": true, "message": "Record deleted"})))
}

#[utoipa::path(
    post,
    path = "/api/collections/{type}/{id}/active",
    tag = "collections",
    params(("type" = String, Path, description = "List content type"), ("id" = i64, Path, description = "Record id")),
    request_body = crate::openapi::SetActiveDoc,
    responses((status = 200, description = "Updated record"), (status = 404, description = "No such record"))
)]
pub async fn set_active(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    let record = repository(&state, &kind)?.set_active(id, payload.active).await?;
    Ok(Json(json!({"success": true, "record": record})))
}
