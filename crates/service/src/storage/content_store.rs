use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::content_type::ContentType;
use crate::errors::ServiceError;
use crate::metrics::{BACKUPS_PRUNED_TOTAL, BACKUP_FAILURES_TOTAL, CONTENT_SAVES_TOTAL};
use crate::storage::write_atomic;

/// Default number of backups kept per content type.
pub const DEFAULT_BACKUP_RETENTION: usize = 10;

/// Type-keyed JSON document store.
///
/// Each [`ContentType`] maps to one pretty-printed JSON file in `data_dir`.
/// Every write first copies the previous file into `data_dir/backups` and
/// rotates that directory down to the newest `retention` copies. There is no
/// in-process locking: concurrent writers to the same type race and the last
/// rename wins.
#[derive(Debug, Clone)]
pub struct ContentStore {
    data_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

/// Acknowledgement returned by [`ContentStore::put`].
#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    pub file: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupInfo {
    pub name: String,
    pub size: u64,
    pub created: DateTime<Utc>,
}

struct BackupEntry {
    path: PathBuf,
    stem: String,
    modified: SystemTime,
    size: u64,
}

impl ContentStore {
    /// Create the store rooted at `data_dir`, creating the data and backup directories.
    pub async fn new<P: Into<PathBuf>>(data_dir: P, retention: usize) -> Result<Arc<Self>, ServiceError> {
        let data_dir = data_dir.into();
        let backups_dir = data_dir.join("backups");
        fs::create_dir_all(&backups_dir)
            .await
            .map_err(|e| ServiceError::write("create data directories", e))?;
        Ok(Arc::new(Self { data_dir, backups_dir, retention: retention.max(1) }))
    }

    pub fn document_path(&self, content_type: ContentType) -> PathBuf {
        self.data_dir.join(content_type.file_name())
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Read the stored document for `content_type`.
    ///
    /// A missing file yields `None`. So does an unreadable or corrupt file,
    /// which is logged and otherwise treated as "no data yet".
    pub async fn get(&self, content_type: ContentType) -> Option<Value> {
        let path = self.document_path(content_type);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(%content_type, error = %e, "content file unreadable");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%content_type, error = %e, "content file is not valid JSON");
                None
            }
        }
    }

    /// Replace the document for `content_type`.
    ///
    /// The previous version is backed up first; a failed backup is logged and
    /// does not stop the write. The new content goes to a temp file that is
    /// renamed over the target.
    pub async fn put(&self, content_type: ContentType, document: &Value) -> Result<SaveReceipt, ServiceError> {
        let body = serde_json::to_vec_pretty(document)
            .map_err(|e| ServiceError::write("serialize document", e))?;

        match self.backup(content_type).await {
            Ok(Some(name)) => debug!(%content_type, backup = %name, "backup created"),
            Ok(None) => {}
            Err(e) => {
                BACKUP_FAILURES_TOTAL.inc();
                warn!(%content_type, error = %e, "backup failed; continuing with write");
            }
        }

        write_atomic(&self.document_path(content_type), &body)
            .await
            .map_err(|e| ServiceError::write("write content file", e))?;

        CONTENT_SAVES_TOTAL.with_label_values(&[content_type.as_str()]).inc();
        info!(%content_type, bytes = body.len(), event = "content_saved", "content document saved");
        Ok(SaveReceipt { file: content_type.file_name(), timestamp: Utc::now() })
    }

    /// List the backups kept for `content_type`, newest first.
    pub async fn list_backups(&self, content_type: ContentType) -> Result<Vec<BackupInfo>, ServiceError> {
        let mut entries = self.scan_backups(content_type).await?;
        entries.sort_by(|a, b| (b.modified, &b.stem).cmp(&(a.modified, &a.stem)));
        Ok(entries
            .into_iter()
            .map(|e| BackupInfo {
                name: e.path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
                size: e.size,
                created: DateTime::<Utc>::from(e.modified),
            })
            .collect())
    }

    /// Copy the current document into the backups directory, then rotate.
    /// Returns the backup file name, or `None` when there was nothing to back up.
    async fn backup(&self, content_type: ContentType) -> Result<Option<String>, ServiceError> {
        let source = self.document_path(content_type);
        if fs::metadata(&source).await.is_err() {
            return Ok(None);
        }

        let stem = content_type.file_stem();
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3f").to_string();
        let mut name = format!("{stem}_{stamp}.json");
        let mut n = 1;
        while fs::try_exists(self.backups_dir.join(&name)).await.unwrap_or(false) {
            name = format!("{stem}_{stamp}-{n}.json");
            n += 1;
        }

        fs::copy(&source, self.backups_dir.join(&name))
            .await
            .map_err(|e| ServiceError::write("copy backup", e))?;

        let pruned = self.prune_backups(content_type).await?;
        if pruned > 0 {
            BACKUPS_PRUNED_TOTAL.inc_by(pruned as u64);
            debug!(%content_type, pruned, "old backups removed");
        }
        Ok(Some(name))
    }

    /// Remove all but the newest `retention` backups of `content_type`, oldest first.
    async fn prune_backups(&self, content_type: ContentType) -> Result<usize, ServiceError> {
        let mut entries = self.scan_backups(content_type).await?;
        if entries.len() <= self.retention {
            return Ok(0);
        }
        entries.sort_by(|a, b| (a.modified, &a.stem).cmp(&(b.modified, &b.stem)));
        let excess = entries.len() - self.retention;
        for entry in entries.iter().take(excess) {
            fs::remove_file(&entry.path)
                .await
                .map_err(|e| ServiceError::write("remove old backup", e))?;
        }
        Ok(excess)
    }

    async fn scan_backups(&self, content_type: ContentType) -> Result<Vec<BackupEntry>, ServiceError> {
        let prefix = format!("{}_", content_type.file_stem());
        let mut dir = match fs::read_dir(&self.backups_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ServiceError::write("read backups directory", e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ServiceError::write("read backups directory", e))?
        {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = file_name.strip_suffix(".json") else { continue };
            if !stem.starts_with(&prefix) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| ServiceError::write("stat backup", e))?;
            if !meta.is_file() {
                continue;
            }
            entries.push(BackupEntry {
                path: entry.path(),
                stem: stem.to_string(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: meta.len(),
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    async fn temp_store(retention: usize) -> (Arc<ContentStore>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("content_store_{}", Uuid::new_v4()));
        let store = ContentStore::new(&dir, retention).await.expect("store init");
        (store, dir)
    }

    async fn backup_docs(store: &ContentStore, content_type: ContentType) -> Vec<Value> {
        let mut docs = Vec::new();
        for info in store.list_backups(content_type).await.unwrap() {
            let bytes = fs::read(store.backups_dir().join(&info.name)).await.unwrap();
            docs.push(serde_json::from_slice(&bytes).unwrap());
        }
        docs
    }

    #[tokio::test]
    async fn news_round_trip() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        let doc = json!({"articles": [{"id": 1, "title": "A"}]});
        let receipt = store.put(ContentType::News, &doc).await?;
        assert_eq!(receipt.file, "news-data.json");
        assert_eq!(store.get(ContentType::News).await, Some(doc));
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn every_type_round_trips() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        for (i, t) in ContentType::ALL.into_iter().enumerate() {
            let doc = json!({"kind": t.as_str(), "n": i, "nested": {"list": [1, "two", null, true]}});
            store.put(t, &doc).await?;
            assert_eq!(store.get(t).await, Some(doc));
        }
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        assert_eq!(store.get(ContentType::Projects).await, None);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn corrupt_document_is_none() {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        fs::write(store.document_path(ContentType::Services), b"{not json").await.unwrap();
        assert_eq!(store.get(ContentType::Services).await, None);
        let _ = fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn first_write_creates_no_backup() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        store.put(ContentType::Investment, &json!({"investments": []})).await?;
        assert!(store.list_backups(ContentType::Investment).await?.is_empty());
        store.put(ContentType::Investment, &json!({"investments": [1]})).await?;
        let backups = store.list_backups(ContentType::Investment).await?;
        assert_eq!(backups.len(), 1);
        assert!(backups[0].name.starts_with("investment-data_"));
        assert_eq!(backup_docs(&store, ContentType::Investment).await, vec![json!({"investments": []})]);
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn rotation_keeps_ten_newest() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        store.put(ContentType::News, &json!({"version": 0})).await?;
        for v in 1..=11 {
            store.put(ContentType::News, &json!({"version": v})).await?;
        }

        let backups = store.list_backups(ContentType::News).await?;
        assert_eq!(backups.len(), 10);

        // 11 backups were taken (versions 0..=10); the oldest one is gone.
        let mut versions: Vec<i64> = backup_docs(&store, ContentType::News)
            .await
            .iter()
            .map(|d| d["version"].as_i64().unwrap())
            .collect();
        assert_eq!(versions.first(), Some(&10), "listing is newest first");
        versions.sort();
        assert_eq!(versions, (1..=10).collect::<Vec<_>>());
        assert_eq!(store.get(ContentType::News).await, Some(json!({"version": 11})));
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn retention_is_per_type() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(3).await;
        for v in 0..6 {
            store.put(ContentType::HeroBanner, &json!({"v": v})).await?;
        }
        store.put(ContentType::HeroMedia, &json!({"v": 0})).await?;
        store.put(ContentType::HeroMedia, &json!({"v": 1})).await?;

        assert_eq!(store.list_backups(ContentType::HeroBanner).await?.len(), 3);
        assert_eq!(store.list_backups(ContentType::HeroMedia).await?.len(), 1);
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn backup_failure_does_not_block_write() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        store.put(ContentType::Recruitment, &json!({"jobs": []})).await?;

        // Replace the backups directory with a plain file so the copy fails.
        fs::remove_dir_all(store.backups_dir()).await?;
        fs::write(store.backups_dir(), b"blocked").await?;

        let doc = json!({"jobs": [{"id": 7}]});
        store.put(ContentType::Recruitment, &doc).await?;
        assert_eq!(store.get(ContentType::Recruitment).await, Some(doc));
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn write_into_missing_data_dir_fails() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        fs::remove_dir_all(&dir).await?;
        let err = store.put(ContentType::News, &json!({})).await.unwrap_err();
        assert!(matches!(err, ServiceError::WriteFailure(_)));
        Ok(())
    }

    #[tokio::test]
    async fn no_temp_files_left_behind() -> Result<(), anyhow::Error> {
        let (store, dir) = temp_store(DEFAULT_BACKUP_RETENTION).await;
        store.put(ContentType::AboutVideo, &json!({"aboutVideo": {"url": "v.mp4"}})).await?;
        let mut rd = fs::read_dir(&dir).await?;
        while let Some(entry) = rd.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            assert!(!name.ends_with(".tmp"), "leftover temp file {name}");
        }
        let _ = fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
