use std::path::PathBuf;
use std::sync::Arc;

use configs::AppConfig;
use service::{
    admin::kv_store::AdminKvStore,
    collections::CollectionRepository,
    content_type::ContentType,
    errors::ServiceError,
    file::admin_kv_store::ApiKeysStore,
    storage::{content_store::ContentStore, image_store::ImageStore},
};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ContentStore>,
    pub images: Arc<ImageStore>,
    pub admin_store: Arc<dyn AdminKvStore>,
    pub web_root: PathBuf,
    pub require_api_key: bool,
}

impl AppState {
    /// Open the stores described by `cfg`, creating their directories.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let storage = &cfg.storage;
        let content = ContentStore::new(&storage.data_dir, storage.backup_retention).await?;
        let images = ImageStore::new(&storage.web_root).await?;
        let admin_store: Arc<dyn AdminKvStore> = ApiKeysStore::new(&cfg.security.api_keys_file).await?;
        Ok(Self {
            content,
            images,
            admin_store,
            web_root: storage.web_root.clone(),
            require_api_key: cfg.security.require_api_key,
        })
    }

    pub fn collection(&self, content_type: ContentType) -> Result<CollectionRepository, ServiceError> {
        CollectionRepository::new(Arc::clone(&self.content), content_type)
    }
}
