//! Integration tests: reader and owner processes coordinating through a
//! shared store and bus, exactly as independent processes would.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bus::InMemoryBus;
use common::{CollectionKey, MutationEvent, Operation, Record, topic};
use kv_store::{InMemoryKeyValueStore, KeyValueStore};
use serde_json::json;
use sync::{CacheClient, FetchCollaborator, FetchError, SyncConfig};
use tokio::sync::RwLock;

/// Fetch double whose dataset can be swapped mid-test, standing in for a
/// mutable system of record.
struct MutableFetch {
    data: RwLock<HashMap<String, Vec<Record>>>,
}

impl MutableFetch {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            data: RwLock::new(HashMap::new()),
        })
    }

    async fn put(&self, collection: &str, records: Vec<Record>) {
        self.data
            .write()
            .await
            .insert(collection.to_string(), records);
    }
}

#[async_trait]
impl FetchCollaborator for MutableFetch {
    async fn load_all(
        &self,
        collection: &CollectionKey,
    ) -> std::result::Result<Vec<Record>, FetchError> {
        Ok(self
            .data
            .read()
            .await
            .get(collection.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

fn fast_config(namespace: &str) -> SyncConfig {
    SyncConfig::new(namespace)
        .max_retries(20)
        .poll_interval(Duration::from_millis(10))
        .retry_delay(Duration::from_millis(10))
}

/// Builds an owner process watching `collections` and a read-only process,
/// both over the same shared store and bus.
async fn owner_and_reader(
    store: &InMemoryKeyValueStore,
    bus: &InMemoryBus,
    fetch: Arc<MutableFetch>,
    collections: &[&str],
) -> (
    CacheClient<InMemoryKeyValueStore, InMemoryBus>,
    CacheClient<InMemoryKeyValueStore, InMemoryBus>,
) {
    let owner = CacheClient::builder(
        store.clone(),
        bus.clone(),
        fast_config("test").watch(collections.iter().copied()),
    )
    .fetch_collaborator(fetch)
    .build()
    .await
    .unwrap();

    let reader = CacheClient::builder(store.clone(), bus.clone(), fast_config("test"))
        .build()
        .await
        .unwrap();

    (owner, reader)
}

#[tokio::test]
async fn cache_miss_primes_once_and_converges() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();

    // The owner warms an empty dataset at build time, so the key is absent.
    let (_owner, reader) = owner_and_reader(&store, &bus, Arc::clone(&fetch), &["Customer"]).await;
    let customer_topic = topic(&CollectionKey::new("Customer"));
    let emitted_before = bus.emitted_count(&customer_topic).await;

    // The system of record now has data the cache has never seen.
    fetch
        .put("Customer", vec![json!({"id": 1, "name": "Tom Cruise"})])
        .await;

    let found = reader
        .find_object(&CollectionKey::new("Customer"), "id", &json!(1))
        .await
        .unwrap();

    assert_eq!(found, Some(json!({"id": 1, "name": "Tom Cruise"})));
    assert_eq!(bus.emitted_count(&customer_topic).await - emitted_before, 1);
}

#[tokio::test]
async fn concurrent_readers_converge_on_the_same_snapshot() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();

    let (_owner, reader) = owner_and_reader(&store, &bus, Arc::clone(&fetch), &["Customer"]).await;
    fetch
        .put("Customer", vec![json!({"id": 1, "name": "Ann"})])
        .await;

    let collection = CollectionKey::new("Customer");
    let id = json!(1);
    let (a, b) = tokio::join!(
        reader.find_objects(&collection, "id", &id),
        reader.find_objects(&collection, "id", &id),
    );

    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a, b);
    assert_eq!(a, vec![json!({"id": 1, "name": "Ann"})]);

    // Duplicate prime requests are harmless: the stored snapshot is intact.
    let raw = store.get("Customer").await.unwrap().unwrap();
    let records: Vec<Record> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(records, vec![json!({"id": 1, "name": "Ann"})]);
}

#[tokio::test]
async fn cached_read_never_touches_the_bus() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();
    fetch
        .put(
            "Customer",
            vec![json!({"id": 1, "name": "Ann"}), json!({"id": 2, "name": "Bo"})],
        )
        .await;

    // Warm happens at build time, so the reader hits on first check.
    let (_owner, reader) = owner_and_reader(&store, &bus, Arc::clone(&fetch), &["Customer"]).await;
    let emitted_before = bus.total_emitted().await;

    let found = reader
        .find_objects(&CollectionKey::new("Customer"), "id", &json!(2))
        .await
        .unwrap();

    assert_eq!(found, vec![json!({"id": 2, "name": "Bo"})]);
    assert_eq!(bus.total_emitted().await, emitted_before);
}

#[tokio::test]
async fn owner_mutation_is_visible_to_remote_readers() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();
    fetch.put("Order", vec![json!({"id": 1, "total": 10})]).await;

    let (owner, reader) = owner_and_reader(&store, &bus, Arc::clone(&fetch), &["Order"]).await;

    // The system of record changes and the owner's lifecycle hook fires.
    fetch
        .put(
            "Order",
            vec![json!({"id": 1, "total": 10}), json!({"id": 2, "total": 25})],
        )
        .await;
    owner
        .notify_mutation(MutationEvent::new(
            "Order",
            Operation::Create,
            Some(json!({"id": 2, "total": 25})),
        ))
        .await
        .unwrap();

    let found = reader
        .find_object(&CollectionKey::new("Order"), "id", &json!(2))
        .await
        .unwrap();
    assert_eq!(found, Some(json!({"id": 2, "total": 25})));
}

#[tokio::test]
async fn filtered_delete_leaves_the_snapshot_untouched() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();
    fetch.put("Order", vec![json!({"id": 1})]).await;

    let owner = CacheClient::builder(
        store.clone(),
        bus.clone(),
        fast_config("test").watch(["Order"]),
    )
    .filter(Arc::new(|_, operation, _| operation != Operation::Delete))
    .fetch_collaborator(Arc::clone(&fetch) as Arc<dyn FetchCollaborator>)
    .build()
    .await
    .unwrap();

    // The record is gone from the system of record, but the delete is
    // filtered so no refresh runs.
    fetch.put("Order", vec![]).await;
    owner
        .notify_mutation(MutationEvent::new(
            "Order",
            Operation::Delete,
            Some(json!({"id": 1})),
        ))
        .await
        .unwrap();

    let raw = store.get("Order").await.unwrap().unwrap();
    let records: Vec<Record> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(records, vec![json!({"id": 1})]);

    // An unfiltered update does refresh, and the empty dataset deletes the key.
    owner
        .notify_mutation(MutationEvent::new("Order", Operation::Update, None))
        .await
        .unwrap();
    assert_eq!(store.get("Order").await.unwrap(), None);
}

#[tokio::test]
async fn reader_on_never_owned_collection_gets_empty_after_bounded_wait() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();

    let reader = CacheClient::builder(
        store,
        bus,
        fast_config("test").max_retries(3),
    )
    .build()
    .await
    .unwrap();

    let found = reader
        .find_objects(&CollectionKey::new("Nobody"), "id", &json!(1))
        .await
        .unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn owner_of_several_collections_serves_each_topic() {
    let store = InMemoryKeyValueStore::new();
    let bus = InMemoryBus::new();
    let fetch = MutableFetch::new();

    let (_owner, reader) =
        owner_and_reader(&store, &bus, Arc::clone(&fetch), &["Customer", "Order"]).await;

    fetch.put("Customer", vec![json!({"id": 1})]).await;
    fetch.put("Order", vec![json!({"id": 9})]).await;

    let customers = reader
        .all_objects(&CollectionKey::new("Customer"))
        .await
        .unwrap();
    let orders = reader.all_objects(&CollectionKey::new("Order")).await.unwrap();

    assert_eq!(customers, vec![json!({"id": 1})]);
    assert_eq!(orders, vec![json!({"id": 9})]);
}
