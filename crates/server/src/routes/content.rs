use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use service::content_type::ContentType;

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveDataRequest {
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub data: Option<Value>,
}

#[utoipa::path(
    get,
    path = "/api/get-data/{type}",
    tag = "content",
    params(("type" = String, Path, description = "Content type, e.g. `news` or `hero-banner`")),
    responses((status = 200, description = "Stored document, or null"), (status = 400, description = "Unknown type"))
)]
pub async fn get_data(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    let content_type: ContentType = kind.parse()?;
    let body = match state.content.get(content_type).await {
        Some(data) => json!({"success": true, "data": data}),
        None => json!({"success": true, "data": null, "message": "No data found"}),
    };
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/api/save-data",
    tag = "content",
    request_body = crate::openapi::SaveDataDoc,
    responses((status = 200, description = "Saved"), (status = 400, description = "Missing or invalid type or data"))
)]
pub async fn save_data(
    State(state): State<AppState>,
    payload: Result<Json<SaveDataRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    let (Some(kind), Some(data)) = (payload.content_type, payload.data) else {
        return Err(JsonApiError::bad_request("Missing type or data"));
    };
    // `"data": null` deserializes as None above
    let content_type: ContentType = kind.parse()?;
    let receipt = state.content.put(content_type, &data).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Data saved successfully",
        "file": receipt.file,
        "timestamp": receipt.timestamp,
    })))
}

#[utoipa::path(
    get,
    path = "/api/backups/{type}",
    tag = "content",
    params(("type" = String, Path, description = "Content type")),
    responses((status = 200, description = "Backups, newest first"), (status = 400, description = "Unknown type"))
)]
pub async fn list_backups(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    let content_type: ContentType = kind.parse()?;
    let backups = state.content.list_backups(content_type).await?;
    Ok(Json(json!({"success": true, "backups": backups})))
}
