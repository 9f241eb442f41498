//! List-shaped content (articles, services, jobs, banners, ...) as typed records.
//!
//! Every list content type stores `{ "<collection key>": [record, ...], ... }`.
//! [`CollectionRepository`] edits that array through the [`ContentStore`], so
//! each change is a normal document write with backup rotation. Top-level keys
//! other than the collection (banner `settings` for instance) are kept as-is.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::content_type::ContentType;
use crate::errors::ServiceError;
use crate::storage::content_store::ContentStore;

/// One entry of a content collection. Fields other than `id`, `order` and
/// `active` are schema-free and preserved verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Record {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Records without an explicit flag are shown.
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Record>, ServiceError>;
    async fn get(&self, id: i64) -> Result<Option<Record>, ServiceError>;
    async fn upsert(&self, record: Record) -> Result<Record, ServiceError>;
    async fn remove(&self, id: i64) -> Result<bool, ServiceError>;
    async fn set_active(&self, id: i64, active: bool) -> Result<Record, ServiceError>;
    async fn published(&self) -> Result<Vec<Record>, ServiceError>;
}

#[derive(Clone)]
pub struct CollectionRepository {
    store: Arc<ContentStore>,
    content_type: ContentType,
    key: &'static str,
}

impl CollectionRepository {
    pub fn new(store: Arc<ContentStore>, content_type: ContentType) -> Result<Self, ServiceError> {
        let key = content_type
            .collection_key()
            .ok_or_else(|| ServiceError::Validation(format!("{content_type} is not a list content type")))?;
        Ok(Self { store, content_type, key })
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    async fn load(&self) -> Result<(Map<String, Value>, Vec<Record>), ServiceError> {
        let mut doc = match self.store.get(self.content_type).await {
            None | Some(Value::Null) => return Ok((Map::new(), Vec::new())),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(ServiceError::Validation(format!(
                    "stored {} document is not an object",
                    self.content_type
                )))
            }
        };
        let records = match doc.remove(self.key) {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                ServiceError::Validation(format!("stored {} records are malformed: {e}", self.content_type))
            })?,
        };
        Ok((doc, records))
    }

    async fn save(&self, mut doc: Map<String, Value>, records: &[Record]) -> Result<(), ServiceError> {
        let value = serde_json::to_value(records).map_err(|e| ServiceError::write("serialize records", e))?;
        doc.insert(self.key.to_string(), value);
        self.store.put(self.content_type, &Value::Object(doc)).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepository for CollectionRepository {
    async fn list(&self) -> Result<Vec<Record>, ServiceError> {
        Ok(self.load().await?.1)
    }

    async fn get(&self, id: i64) -> Result<Option<Record>, ServiceError> {
        Ok(self.load().await?.1.into_iter().find(|r| r.id == id))
    }

    /// Replace the record with the same id, or append it. Records without an
    /// id get one derived from the current time; new records without an
    /// `order` go to the end.
    async fn upsert(&self, mut record: Record) -> Result<Record, ServiceError> {
        let (doc, mut records) = self.load().await?;
        if record.id <= 0 {
            let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
            record.id = Utc::now().timestamp_millis().max(max_id + 1);
        }
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => {
                if record.order.is_none() {
                    record.order = Some(records.len() as i64 + 1);
                }
                records.push(record.clone());
            }
        }
        self.save(doc, &records).await?;
        Ok(record)
    }

    async fn remove(&self, id: i64) -> Result<bool, ServiceError> {
        let (doc, mut records) = self.load().await?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(false);
        }
        self.save(doc, &records).await?;
        Ok(true)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<Record, ServiceError> {
        let (doc, mut records) = self.load().await?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ServiceError::not_found("record"))?;
        record.active = Some(active);
        let updated = record.clone();
        self.save(doc, &records).await?;
        Ok(updated)
    }

    /// Active records in display order.
    async fn published(&self) -> Result<Vec<Record>, ServiceError> {
        let mut records: Vec<Record> = self.list().await?.into_iter().filter(Record::is_active).collect();
        records.sort_by_key(|r| r.order.unwrap_or(i64::MAX));
        Ok(records)
    }
}
