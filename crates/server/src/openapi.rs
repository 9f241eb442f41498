use serde_json::Value;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct SaveDataDoc {
    /// Content type, e.g. `news`
    pub r#type: String,
    #[schema(value_type = Object)]
    pub data: Value,
}

#[derive(ToSchema)]
pub struct UploadImageDoc {
    /// `data:image/<subtype>;base64,<payload>`
    pub image: String,
    pub folder: Option<String>,
    pub filename: Option<String>,
}

#[derive(ToSchema)]
pub struct UploadImagesDoc {
    pub images: Vec<String>,
    pub folder: Option<String>,
}

#[derive(ToSchema)]
pub struct DeleteImageDoc {
    /// Web path under `images/uploads/`
    pub path: String,
}

#[derive(ToSchema)]
pub struct RecordDoc {
    /// Omit or 0 to create
    pub id: Option<i64>,
    pub order: Option<i64>,
    pub active: Option<bool>,
}

#[derive(ToSchema)]
pub struct SetActiveDoc { pub active: bool }

#[derive(ToSchema)]
pub struct RenderBlocksDoc {
    /// Array of blocks tagged by `type`
    #[schema(value_type = Object)]
    pub blocks: Value,
}

#[derive(ToSchema)]
pub struct ApiKeyRecordDoc { pub user: String, pub api_key: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::content::get_data,
        crate::routes::content::save_data,
        crate::routes::content::list_backups,
        crate::routes::images::upload_image,
        crate::routes::images::upload_images,
        crate::routes::images::delete_image,
        crate::routes::images::list_images,
        crate::routes::images::list_images_in,
        crate::routes::collections::list,
        crate::routes::collections::published,
        crate::routes::collections::get,
        crate::routes::collections::upsert,
        crate::routes::collections::remove,
        crate::routes::collections::set_active,
        crate::routes::blocks::render_blocks,
        crate::routes::admin::list_api_keys,
        crate::routes::admin::set_api_key,
        crate::routes::admin::delete_api_key,
    ),
    components(
        schemas(
            SaveDataDoc,
            UploadImageDoc,
            UploadImagesDoc,
            DeleteImageDoc,
            RecordDoc,
            SetActiveDoc,
            RenderBlocksDoc,
            ApiKeyRecordDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "content"),
        (name = "images"),
        (name = "collections"),
        (name = "blocks"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
