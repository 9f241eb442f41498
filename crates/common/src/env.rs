//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::warn;

/// Ensure the storage directories exist; warn when the web root is missing.
pub async fn ensure_env(web_root: &Path, dirs: &[&Path]) -> anyhow::Result<()> {
    if tokio::fs::metadata(web_root).await.is_err() {
        warn!(web_root = %web_root.display(), "web root not found; static pages may 404");
    }
    for dir in dirs {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    }
    Ok(())
}
