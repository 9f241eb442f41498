use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    pub image: Option<String>,
    pub folder: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadImagesRequest {
    #[serde(default)]
    pub images: Vec<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageRequest {
    pub path: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/upload-image",
    tag = "images",
    request_body = crate::openapi::UploadImageDoc,
    responses(
        (status = 200, description = "Stored"),
        (status = 400, description = "Missing or malformed image"),
        (status = 403, description = "Folder outside uploads")
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    let image = payload
        .image
        .filter(|i| !i.is_empty())
        .ok_or_else(|| JsonApiError::bad_request("No image data provided"))?;
    let uploaded = state
        .images
        .upload_image(&image, payload.folder.as_deref(), payload.filename.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Image uploaded successfully",
        "path": uploaded.path,
        "filename": uploaded.filename,
        "size": uploaded.size,
    })))
}

#[utoipa::path(
    post,
    path = "/api/upload-images",
    tag = "images",
    request_body = crate::openapi::UploadImagesDoc,
    responses((status = 200, description = "Per-image results"), (status = 400, description = "No images"))
)]
pub async fn upload_images(
    State(state): State<AppState>,
    payload: Result<Json<UploadImagesRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    if payload.images.is_empty() {
        return Err(JsonApiError::bad_request("No images provided"));
    }
    let results = state
        .images
        .upload_images(&payload.images, payload.folder.as_deref())
        .await?;
    let stored = results.iter().filter(|r| r.success).count();
    Ok(Json(json!({
        "success": true,
        "message": format!("Uploaded {}/{} images", stored, results.len()),
        "results": results,
    })))
}

#[utoipa::path(
    delete,
    path = "/api/delete-image",
    tag = "images",
    request_body = crate::openapi::DeleteImageDoc,
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Path outside uploads"),
        (status = 404, description = "No such image")
    )
)]
pub async fn delete_image(
    State(state): State<AppState>,
    payload: Result<Json<DeleteImageRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    let path = payload
        .path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| JsonApiError::bad_request("No image path provided"))?;
    state.images.delete_image(&path).await?;
    Ok(Json(json!({"success": true, "message": "Image deleted successfully"})))
}

#[utoipa::path(
    get,
    path = "/api/list-images",
    tag = "images",
    responses((status = 200, description = "Images in the uploads root, newest first"))
)]
pub async fn list_images(State(state): State<AppState>) -> Result<Json<Value>, JsonApiError> {
    list(&state, None).await
}

#[utoipa::path(
    get,
    path = "/api/list-images/{folder}",
    tag = "images",
    params(("folder" = String, Path, description = "Folder under images/uploads")),
    responses((status = 200, description = "Images in the folder"), (status = 403, description = "Folder outside uploads"))
)]
pub async fn list_images_in(
    State(state): State<AppState>,
    Path(folder): Path<String>,
) -> Result<Json<Value>, JsonApiError> {
    list(&state, Some(&folder)).await
}

async fn list(state: &AppState, folder: Option<&str>) -> Result<Json<Value>, JsonApiError> {
    let images = state.images.list_images(folder).await?;
    Ok(Json(json!({"success": true, "count": images.len(), "images": images})))
}
