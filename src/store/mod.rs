//! Persistence port for item documents.
//!
//! The submission workflow and the CLI only talk to [`ItemStore`]; which
//! document store sits behind it is decided by configuration.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::errors::ServiceError;
use crate::models::item::{ItemId, ItemRecord, StockItem};

pub mod memory;
pub mod push_id;
pub mod realtime_db;

pub use memory::InMemoryItemStore;
pub use push_id::PushIdGenerator;
pub use realtime_db::RealtimeDbStore;

/// A document store holding item collections.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Appends `item` under `collection` and returns the generated key.
    /// Never replaces a document stored under another key.
    async fn create(&self, collection: &str, item: &StockItem) -> Result<ItemId, ServiceError>;

    /// Every document of `collection`, ordered by key.
    async fn list(&self, collection: &str) -> Result<Vec<ItemRecord>, ServiceError>;
}

/// Builds the store selected by `config`.
pub fn store_from_config(config: &AppConfig) -> Result<Arc<dyn ItemStore>, ServiceError> {
    match config.backend() {
        StoreBackend::Memory => Ok(Arc::new(InMemoryItemStore::new())),
        StoreBackend::RealtimeDb => Ok(Arc::new(RealtimeDbStore::from_config(config)?)),
    }
}
