//! Item store backed by the Firebase Realtime Database REST API.
//!
//! `POST {base}/{collection}.json` pushes a document and answers with
//! `{"name": "<key>"}`; `GET {base}/{collection}.json` answers with `null`,
//! an object keyed by document key, or an array when the keys are mostly
//! small integers.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::ItemStore;
use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::models::item::{ItemId, ItemRecord, StockItem};

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Collection body of a `GET`. Integer-keyed collections come back as an
/// array with `null` holes.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Documents {
    Keyed(BTreeMap<String, serde_json::Value>),
    Indexed(Vec<Option<serde_json::Value>>),
}

impl Documents {
    fn into_entries(self) -> Vec<(String, serde_json::Value)> {
        match self {
            Documents::Keyed(map) => map.into_iter().collect(),
            Documents::Indexed(slots) => slots
                .into_iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.map(|value| (index.to_string(), value)))
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RealtimeDbStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RealtimeDbStore {
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::ConfigError(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let base_url = config
            .database_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ServiceError::ConfigError("database_url is not configured".into()))?;
        Self::new(base_url, config.auth_token.clone(), config.submit_timeout())
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.base_url, collection.trim_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.query(&[("auth", token.as_str())]),
            None => request,
        }
    }

    async fn check(response: Response, action: &str) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!(%status, action, "realtime database rejected request");
        Err(ServiceError::ExternalServiceError(format!(
            "{} failed with status {}: {}",
            action,
            status,
            body.trim()
        )))
    }
}

#[async_trait]
impl ItemStore for RealtimeDbStore {
    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create(&self, collection: &str, item: &StockItem) -> Result<ItemId, ServiceError> {
        let request = self
            .authorize(self.client.post(self.collection_url(collection)))
            .json(item);

        let response = Self::check(request.send().await?, "push").await?;
        let pushed: PushResponse = response.json().await?;

        info!(id = %pushed.name, collection, "item pushed to realtime database");
        Ok(ItemId(pushed.name))
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> Result<Vec<ItemRecord>, ServiceError> {
        let request = self.authorize(self.client.get(self.collection_url(collection)));
        let response = Self::check(request.send().await?, "read").await?;
        let documents: Option<Documents> = response.json().await?;

        let mut records = Vec::new();
        for (key, value) in documents.map(Documents::into_entries).unwrap_or_default() {
            match serde_json::from_value::<StockItem>(value) {
                Ok(item) => records.push(ItemRecord::new(key, item)),
                Err(e) => warn!(%key, error = %e, "skipping malformed item document"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_normalized() {
        let store = RealtimeDbStore::new(
            "https://stock-default-rtdb.firebaseio.com/",
            Some("   ".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            store.collection_url("/items/"),
            "https://stock-default-rtdb.firebaseio.com/items.json"
        );
        assert!(store.auth_token.is_none());
    }

    #[test]
    fn array_bodies_keep_their_indices_as_keys() {
        let documents: Documents =
            serde_json::from_str(r#"[null, {"name": "a"}, null, {"name": "b"}]"#).unwrap();
        let keys: Vec<String> = documents.into_entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["1", "3"]);
    }

    #[test]
    fn from_config_requires_database_url() {
        let config = AppConfig::default();
        assert!(matches!(
            RealtimeDbStore::from_config(&config),
            Err(ServiceError::ConfigError(_))
        ));
    }
}
