//! Runtime environment helpers
//!
//! Thin wrapper around `common::env` so the server crate prepares the
//! storage layout without depending directly on `common`.

use std::path::Path;

/// Ensure the data, backup and upload directories exist; warn on a missing web root.
pub async fn ensure_env(web_root: &Path, data_dir: &Path, backups_dir: &Path, uploads_dir: &Path) -> anyhow::Result<()> {
    common::env::ensure_env(web_root, &[data_dir, backups_dir, uploads_dir]).await
}
