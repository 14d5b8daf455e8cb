use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{ItemStore, PushIdGenerator};
use crate::errors::ServiceError;
use crate::models::item::{ItemId, ItemRecord, StockItem};

/// Process-local item store. Collections are kept in key order, which is
/// creation order because keys come from a [`PushIdGenerator`].
#[derive(Debug, Default)]
pub struct InMemoryItemStore {
    collections: RwLock<HashMap<String, BTreeMap<ItemId, StockItem>>>,
    ids: PushIdGenerator,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `collection` already holds `records`.
    pub fn with_records(collection: &str, records: Vec<ItemRecord>) -> Self {
        let documents = records
            .into_iter()
            .map(|record| (record.id, record.item))
            .collect();
        let mut collections = HashMap::new();
        collections.insert(collection.to_string(), documents);
        Self {
            collections: RwLock::new(collections),
            ids: PushIdGenerator::new(),
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create(&self, collection: &str, item: &StockItem) -> Result<ItemId, ServiceError> {
        let id = ItemId(self.ids.next_id());
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        if documents.contains_key(&id) {
            return Err(ServiceError::Conflict(format!(
                "key {} already exists in {}",
                id, collection
            )));
        }
        documents.insert(id.clone(), item.clone());
        debug!(%id, collection, "item stored in memory");
        Ok(id)
    }

    async fn list(&self, collection: &str) -> Result<Vec<ItemRecord>, ServiceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .map(|(id, item)| ItemRecord::new(id.clone(), item.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
