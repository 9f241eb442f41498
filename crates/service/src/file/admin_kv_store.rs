use std::sync::Arc;
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::admin::kv_store::AdminKvStore;

/// File-backed key-value store for Admin API keys.
/// Keeps a map of `user -> api_key` persisted as JSON.
#[derive(Clone)]
pub struct ApiKeysStore {
    store: Arc<JsonMapStore<String, String>>,
}

impl ApiKeysStore {
    /// Initialize the store from the given file path. Creates the file if missing.
    pub async fn new<P: Into<std::path::PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let store = JsonMapStore::<String, String>::new(path).await?;
        Ok(Arc::new(Self { store }))
    }

    /// List all entries as `(user, api_key)` pairs, sorted by user.
    pub async fn list(&self) -> Vec<(String, String)> {
        let mut entries = self.store.list().await;
        entries.sort();
        entries
    }

    /// Upsert the API key for a user and persist.
    pub async fn set(&self, user: String, api_key: String) -> Result<(), ServiceError> {
        let user = user.trim().to_string();
        let api_key = api_key.trim().to_string();
        if user.is_empty() || api_key.is_empty() {
            return Err(ServiceError::Validation("user and api_key are required".into()));
        }
        self.store.insert(user, api_key).await
    }

    /// Delete the API key for a user; returns whether an entry existed.
    pub async fn delete(&self, user: &str) -> Result<bool, ServiceError> {
        self.store.remove(&user.to_string()).await
    }

    /// Check whether any stored API key equals the given value.
    pub async fn contains_value(&self, value: &str) -> bool {
        self.store.contains_value(&value.to_string()).await
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty().await
    }
}

#[async_trait::async_trait]
impl AdminKvStore for ApiKeysStore {
    async fn list(&self) -> Vec<(String, String)> { self.list().await }
    async fn set(&self, user: String, api_key: String) -> Result<(), ServiceError> { self.set(user, api_key).await }
    async fn delete(&self, user: &str) -> Result<bool, ServiceError> { self.delete(user).await }
    async fn contains_value(&self, value: &str) -> bool { self.contains_value(value).await }
    async fn is_empty(&self) -> bool { self.is_empty().await }
}
