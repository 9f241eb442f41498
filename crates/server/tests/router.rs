use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use tower::Service;
use uuid::Uuid;

// 8-byte PNG signature
const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

/// The default config layout (`public/`, `data/`, `data/api_keys.json`) rooted at `root`.
fn shipped_layout(root: &std::path::Path, require_api_key: bool) -> AppConfig {
    let defaults = AppConfig::default();
    let mut cfg = AppConfig::default();
    cfg.storage.web_root = root.join(&defaults.storage.web_root);
    cfg.storage.data_dir = root.join(&defaults.storage.data_dir);
    cfg.security.api_keys_file = root.join(&defaults.security.api_keys_file);
    cfg.security.require_api_key = require_api_key;
    cfg
}

struct TestSite {
    root: PathBuf,
    app: Router,
}

impl TestSite {
    async fn new(require_api_key: bool) -> anyhow::Result<Self> {
        let root = std::env::temp_dir().join(format!("site_router_{}", Uuid::new_v4()));
        let cfg = shipped_layout(&root, require_api_key);
        tokio::fs::create_dir_all(&cfg.storage.web_root).await?;
        tokio::fs::write(cfg.storage.web_root.join("index.html"), "<h1>home</h1>").await?;
        let app = server::startup::build_app(&cfg).await?;
        Ok(Self { root, app })
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>, api_key: Option<&str>) -> anyhow::Result<(StatusCode, Value)> {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            req = req.header("X-API-Key", key);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => req.body(Body::empty())?,
        };
        let res = self.app.clone().call(req).await?;
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok((status, value))
    }

    async fn cleanup(self) {
        let _ = tokio::fs::remove_dir_all(&self.root).await;
    }
}

#[tokio::test]
async fn health_reports_running() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;
    let (status, body) = site.send("GET", "/api/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Server is running");
    assert!(body["timestamp"].is_string());
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn save_then_get_round_trips_and_backs_up() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site.send("GET", "/api/get-data/news", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["message"], "No data found");

    let doc = json!({"articles": [{"id": 1, "title": "A"}]});
    let (status, body) = site
        .send("POST", "/api/save-data", Some(json!({"type": "news", "data": doc})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Data saved successfully");
    assert_eq!(body["file"], "news-data.json");

    let (_, body) = site.send("GET", "/api/get-data/news", None, None).await?;
    assert_eq!(body["data"], doc);

    site.send("POST", "/api/save-data", Some(json!({"type": "news", "data": {"articles": []}})), None)
        .await?;
    let (status, body) = site.send("GET", "/api/backups/news", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let backups = body["backups"].as_array().cloned().unwrap_or_default();
    assert_eq!(backups.len(), 1);
    assert!(backups[0]["name"].as_str().unwrap_or_default().starts_with("news-data_"));
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn save_rejects_bad_requests() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site
        .send("POST", "/api/save-data", Some(json!({"type": "users", "data": {}})), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap_or_default().contains("users"));

    let (status, _) = site.send("POST", "/api/save-data", Some(json!({"type": "news"})), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = site
        .send("POST", "/api/save-data", Some(json!({"type": "news", "data": null})), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = site.send("GET", "/api/get-data/users", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn image_upload_list_and_delete() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site
        .send("POST", "/api/upload-image", Some(json!({"image": PNG, "folder": "banners"})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let path = body["path"].as_str().unwrap_or_default().to_string();
    assert!(path.starts_with("images/uploads/banners/img_"));
    assert!(path.ends_with(".png"));
    assert_eq!(body["size"], 8);
    assert!(site.root.join("public").join(&path).exists());

    let (status, body) = site.send("GET", "/api/list-images/banners", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["images"][0]["path"], path.as_str());

    let (status, _) = site
        .send("DELETE", "/api/delete-image", Some(json!({"path": "data/news-data.json"})), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = site
        .send("DELETE", "/api/delete-image", Some(json!({"path": "images/uploads/../index.html"})), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(site.root.join("public").join("index.html").exists());

    let (status, body) = site.send("DELETE", "/api/delete-image", Some(json!({"path": path})), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image deleted successfully");
    let (status, _) = site.send("DELETE", "/api/delete-image", Some(json!({"path": path})), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn image_upload_rejects_malformed_payloads() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site
        .send("POST", "/api/upload-image", Some(json!({"image": "hello"})), None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = site.send("POST", "/api/upload-image", Some(json!({})), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = site
        .send("POST", "/api/upload-image", Some(json!({"image": PNG, "folder": "../../etc"})), None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = site.send("GET", "/api/list-images", None, None).await?;
    assert_eq!(body["count"], 0);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn batch_upload_reports_each_item() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site
        .send("POST", "/api/upload-images", Some(json!({"images": [PNG, "nope"], "folder": "news"})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Uploaded 1/2 images");
    assert_eq!(body["results"][0]["success"], true);
    assert!(body["results"][0]["path"].as_str().unwrap_or_default().starts_with("images/uploads/news/"));
    assert_eq!(body["results"][1]["success"], false);
    assert!(body["results"][1]["error"].is_string());

    let (status, _) = site.send("POST", "/api/upload-images", Some(json!({"images": []})), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn collection_records_lifecycle() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;

    let (status, body) = site
        .send("POST", "/api/collections/recruitment", Some(json!({"title": "Engineer", "active": false})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let id = body["record"]["id"].as_i64().unwrap_or_default();
    assert!(id > 0);

    let (_, body) = site.send("GET", "/api/collections/recruitment/published", None, None).await?;
    assert_eq!(body["count"], 0);

    let uri = format!("/api/collections/recruitment/{id}/active");
    let (status, body) = site.send("POST", &uri, Some(json!({"active": true})), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["active"], true);

    let (_, body) = site.send("GET", "/api/collections/recruitment/published", None, None).await?;
    assert_eq!(body["records"][0]["title"], "Engineer");

    // collection edits are ordinary document writes
    let (_, body) = site.send("GET", "/api/get-data/recruitment", None, None).await?;
    assert_eq!(body["data"]["jobs"][0]["id"], id);

    let uri = format!("/api/collections/recruitment/{id}");
    let (status, _) = site.send("DELETE", &uri, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = site.send("GET", &uri, None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = site.send("GET", "/api/collections/about-video", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn render_blocks_returns_html() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;
    let blocks = json!({"blocks": [
        {"type": "heading", "level": 2, "text": "News"},
        {"type": "divider"}
    ]});
    let (status, body) = site.send("POST", "/api/render-blocks", Some(blocks), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["html"], "<h2>News</h2><hr>");
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn api_keys_guard_mutations_when_required() -> anyhow::Result<()> {
    let site = TestSite::new(true).await?;
    let save = json!({"type": "about-video", "data": {"aboutVideo": {"url": "v.mp4"}}});

    let (status, _) = site.send("POST", "/api/save-data", Some(save.clone()), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // first key can be created without one
    let (status, _) = site
        .send("POST", "/admin/api-keys", Some(json!({"user": "editor", "api_key": "k-1"})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = site.send("GET", "/admin/api-keys", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = site.send("GET", "/admin/api-keys", None, Some("k-1")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"][0]["user"], "editor");

    let (status, _) = site.send("POST", "/api/save-data", Some(save.clone()), Some("wrong")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = site.send("POST", "/api/save-data", Some(save.clone()), Some("k-1")).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = site.send("POST", "/api/save-data?api_key=k-1", Some(save), None).await?;
    assert_eq!(status, StatusCode::OK);

    // reads stay public
    let (status, body) = site.send("GET", "/api/get-data/about-video", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["aboutVideo"]["url"], "v.mp4");

    let (status, _) = site.send("DELETE", "/admin/api-keys/nobody", None, Some("k-1")).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn unknown_paths_serve_the_site() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;
    let req = Request::builder().uri("/about/team").body(Body::empty())?;
    let res = site.app.clone().call(req).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"<h1>home</h1>");
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn metrics_expose_counters() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;
    site.send("POST", "/api/save-data", Some(json!({"type": "services", "data": {"services": []}})), None)
        .await?;
    let req = Request::builder().uri("/metrics").body(Body::empty())?;
    let res = site.app.clone().call(req).await?;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("site_content_saves_total"));
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn api_keys_are_not_served_as_static_files() -> anyhow::Result<()> {
    let site = TestSite::new(true).await?;
    let (status, _) = site
        .send("POST", "/admin/api-keys", Some(json!({"user": "editor", "api_key": "s3cret"})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);

    for uri in ["/data/api_keys.json", "/../data/api_keys.json", "/api_keys.json", "/data/backups"] {
        let req = Request::builder().uri(uri).body(Body::empty())?;
        let res = site.app.clone().call(req).await?;
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
        assert!(!String::from_utf8_lossy(&bytes).contains("s3cret"), "{uri} leaked a key");
    }
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn private_files_inside_web_root_are_refused() -> anyhow::Result<()> {
    let defaults = AppConfig::default();
    assert!(!defaults.storage.data_dir.starts_with(&defaults.storage.web_root));
    assert!(!defaults.security.api_keys_file.starts_with(&defaults.storage.web_root));

    // site served from the directory that also holds data/
    let root = std::env::temp_dir().join(format!("site_router_{}", Uuid::new_v4()));
    let mut cfg = shipped_layout(&root, true);
    cfg.storage.web_root = root.clone();
    let err = server::startup::build_app(&cfg).await.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("storage.data_dir"), "unexpected: {err}");

    let mut cfg = shipped_layout(&root, true);
    cfg.security.api_keys_file = cfg.storage.web_root.join("keys.json");
    let err = server::startup::build_app(&cfg).await.err().map(|e| e.to_string()).unwrap_or_default();
    assert!(err.contains("security.api_keys_file"), "unexpected: {err}");

    let _ = tokio::fs::remove_dir_all(&root).await;
    Ok(())
}

#[tokio::test]
async fn nested_folders_list_separately() -> anyhow::Result<()> {
    let site = TestSite::new(false).await?;
    let (status, body) = site
        .send("POST", "/api/upload-image", Some(json!({"image": PNG, "folder": "gallery/2024"})), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let path = body["path"].as_str().unwrap_or_default().to_string();
    assert!(path.starts_with("images/uploads/gallery/2024/"));
    site.send("POST", "/api/upload-image", Some(json!({"image": PNG, "folder": "gallery"})), None)
        .await?;

    let (status, body) = site.send("GET", "/api/list-images/gallery/2024", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["images"][0]["path"], path.as_str());

    let (_, body) = site.send("GET", "/api/list-images/gallery", None, None).await?;
    assert_eq!(body["count"], 1);
    assert_ne!(body["images"][0]["path"], path.as_str());

    let (status, _) = site.send("GET", "/api/list-images/gallery/..%2F..%2F..", None, None).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    site.cleanup().await;
    Ok(())
}

#[tokio::test]
async fn query_api_key_is_percent_decoded() -> anyhow::Result<()> {
    let site = TestSite::new(true).await?;
    site.send("POST", "/admin/api-keys", Some(json!({"user": "editor", "api_key": "a+b/c=d&e"})), None)
        .await?;
    let save = json!({"type": "services", "data": {"services": []}});
    let (status, _) = site
        .send("POST", "/api/save-data?api_key=a%2Bb%2Fc%3Dd%26e", Some(save.clone()), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = site.send("POST", "/api/save-data?api_key=a+b/c=d", Some(save), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    site.cleanup().await;
    Ok(())
}
