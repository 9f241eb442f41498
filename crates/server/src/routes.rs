pub mod admin;
pub mod blocks;
pub mod collections;
pub mod content;
pub mod images;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use common::types::Health;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::state::AppState;

#[utoipa::path(get, path = "/api/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health::ok())
}

pub async fn metrics() -> impl IntoResponse {
    match service::metrics::encode_metrics() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body),
        Err(e) => {
            error!(error = %e, event = "metrics_encode_failed", "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, [(header::CONTENT_TYPE, "text/plain")], String::new())
        }
    }
}

/// Build the full application router: content API, admin API, docs and the static site.
pub fn build_router(state: AppState, cors: CorsLayer, body_limit: usize) -> Router {
    let index = state.web_root.join("index.html");
    let static_site = ServeDir::new(&state.web_root).fallback(ServeFile::new(index));

    // Read-only routes
    let public = Router::new()
        .route("/api/health", get(health))
        .route("/api/get-data/:type", get(content::get_data))
        .route("/api/backups/:type", get(content::list_backups))
        .route("/api/list-images", get(images::list_images))
        .route("/api/list-images/*folder", get(images::list_images_in))
        .route("/api/collections/:type", get(collections::list))
        .route("/api/collections/:type/published", get(collections::published))
        .route("/api/collections/:type/:id", get(collections::get))
        .route("/api/render-blocks", post(blocks::render_blocks))
        .route("/metrics", get(metrics));

    // Mutating routes, guarded when api keys are required
    let guarded = Router::new()
        .route("/api/save-data", post(content::save_data))
        .route("/api/upload-image", post(images::upload_image))
        .route("/api/upload-images", post(images::upload_images))
        .route("/api/delete-image", delete(images::delete_image))
        .route("/api/collections/:type", post(collections::upsert))
        .route("/api/collections/:type/:id", delete(collections::remove))
        .route("/api/collections/:type/:id/active", post(collections::set_active))
        .route("/admin/api-keys", get(admin::list_api_keys).post(admin::set_api_key))
        .route("/admin/api-keys/:user", delete(admin::delete_api_key))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin::require_api_key));

    public
        .merge(guarded)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_site)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
