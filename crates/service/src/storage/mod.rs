//! Storage abstractions for service layer
//!
//! File-backed stores: the generic JSON map used for admin keys, the
//! type-keyed content document store and the uploaded image store.

use std::path::Path;

use tokio::fs;
use uuid::Uuid;

pub mod json_map_store;
pub mod content_store;
pub mod image_store;

/// Write `bytes` to a sibling temp file and rename it over `path`, so readers
/// never observe a partially written file.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()));
    if let Err(e) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}
