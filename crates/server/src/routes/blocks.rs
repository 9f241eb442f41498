use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use service::blocks::{render_html, Block};

use crate::errors::JsonApiError;

#[derive(Debug, Deserialize)]
pub struct RenderBlocksRequest {
    #[serde(default)]
    pub blocks: Vec<Block>,
}

#[utoipa::path(
    post,
    path = "/api/render-blocks",
    tag = "blocks",
    request_body = crate::openapi::RenderBlocksDoc,
    responses((status = 200, description = "Rendered HTML"), (status = 422, description = "Unknown block type"))
)]
pub async fn render_blocks(
    payload: Result<Json<RenderBlocksRequest>, JsonRejection>,
) -> Result<Json<Value>, JsonApiError> {
    let Json(payload) = payload?;
    Ok(Json(json!({"success": true, "html": render_html(&payload.blocks)})))
}
