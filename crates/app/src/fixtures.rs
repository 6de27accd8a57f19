//! Demo system of record: a fixed in-process dataset.
//!
//! A real integration supplies a fetch collaborator backed by its data
//! access layer; this one serves canned customers and orders so the cache
//! paths can be exercised end to end.

use std::collections::HashMap;

use async_trait::async_trait;
use common::{CollectionKey, Record};
use serde_json::json;
use sync::{FetchCollaborator, FetchError};

pub struct DemoDataset {
    collections: HashMap<String, Vec<Record>>,
}

impl DemoDataset {
    pub fn new() -> Self {
        let collections = HashMap::from([
            (
                "Customer".to_string(),
                vec![
                    json!({"id": 1, "name": "Tom Cruise"}),
                    json!({"id": 2, "name": "Ann Veal"}),
                ],
            ),
            (
                "Order".to_string(),
                vec![
                    json!({"id": 100, "customerId": 1, "total": 1999}),
                    json!({"id": 101, "customerId": 2, "total": 499}),
                ],
            ),
        ]);
        Self { collections }
    }
}

impl Default for DemoDataset {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FetchCollaborator for DemoDataset {
    async fn load_all(
        &self,
        collection: &CollectionKey,
    ) -> std::result::Result<Vec<Record>, FetchError> {
        Ok(self
            .collections
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_collection_loads_records() {
        let dataset = DemoDataset::new();
        let customers = dataset
            .load_all(&CollectionKey::new("Customer"))
            .await
            .unwrap();
        assert_eq!(customers.len(), 2);
    }

    #[tokio::test]
    async fn unknown_collection_loads_empty() {
        let dataset = DemoDataset::new();
        let nothing = dataset
            .load_all(&CollectionKey::new("Ghost"))
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }
}
