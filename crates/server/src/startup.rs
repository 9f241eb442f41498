use std::net::SocketAddr;
use std::path::Path;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::AppState;
use service::runtime;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Resolve the listen address from the server section.
fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// The web root is served as-is, so documents, backups and api keys must live outside it.
async fn ensure_private_outside_web_root(cfg: &AppConfig) -> anyhow::Result<()> {
    let web_root = tokio::fs::canonicalize(&cfg.storage.web_root).await?;
    let private: [(&str, &Path); 2] = [
        ("storage.data_dir", cfg.storage.data_dir.as_path()),
        ("security.api_keys_file", cfg.security.api_keys_file.as_path()),
    ];
    for (key, path) in private {
        let resolved = tokio::fs::canonicalize(path).await?;
        if resolved.starts_with(&web_root) {
            anyhow::bail!(
                "{key} ({}) is inside storage.web_root ({}) and would be served publicly",
                path.display(),
                cfg.storage.web_root.display()
            );
        }
    }
    Ok(())
}

/// Prepare the storage layout and build the application router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let storage = &cfg.storage;
    runtime::ensure_env(&storage.web_root, &storage.data_dir, &storage.backups_dir(), &storage.uploads_dir()).await?;

    let state = AppState::from_config(cfg).await?;
    ensure_private_outside_web_root(cfg).await?;
    Ok(routes::build_router(state, build_cors(), cfg.server.body_limit_bytes))
}

/// Public entry: build the app and run the HTTP server until the listener fails.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        data_dir = %cfg.storage.data_dir.display(),
        web_root = %cfg.storage.web_root.display(),
        require_api_key = cfg.security.require_api_key,
        event = "listening",
        "content server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
