//! Client handle wiring the read path, write path, and bus subscriptions.

use std::collections::HashSet;
use std::sync::Arc;

use bus::{InvalidationBus, MessageHandler};
use common::{CollectionKey, MutationEvent, PrimeRequest, Record, topic};
use kv_store::KeyValueStore;

use crate::config::{ConfigurationError, SyncConfig};
use crate::filter::{FilterChain, FilterPredicate};
use crate::reader::SyncCoordinator;
use crate::refresher::{FetchCollaborator, RefreshCoordinator, RefreshTrigger};
use crate::Result;

/// Builder for [`CacheClient`]. Validates the configuration before any
/// subscription is made; invalid options fail construction immediately.
pub struct CacheClientBuilder<S, B> {
    store: S,
    bus: B,
    config: SyncConfig,
    filters: Vec<FilterPredicate>,
    fetch: Option<Arc<dyn FetchCollaborator>>,
}

impl<S, B> CacheClientBuilder<S, B>
where
    S: KeyValueStore + Clone + 'static,
    B: InvalidationBus,
{
    /// Appends one filter predicate.
    pub fn filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Replaces the filter list wholesale.
    pub fn filters(mut self, filters: Vec<FilterPredicate>) -> Self {
        self.filters = filters;
        self
    }

    /// Supplies the per-collection full-reload function. Required when any
    /// collection is watched.
    pub fn fetch_collaborator(mut self, fetch: Arc<dyn FetchCollaborator>) -> Self {
        self.fetch = Some(fetch);
        self
    }

    /// Validates options, wires subscriptions for every watched collection,
    /// and warms their entries with an initial refresh.
    pub async fn build(self) -> Result<CacheClient<S, B>> {
        self.config.validate()?;

        let bus = Arc::new(self.bus);
        let reader = SyncCoordinator::new(
            self.store.clone(),
            Arc::clone(&bus),
            self.config.max_retries,
            self.config.poll_interval,
        );

        let watched: Arc<HashSet<CollectionKey>> =
            Arc::new(self.config.watched_collections.iter().cloned().collect());

        if watched.is_empty() {
            tracing::info!(namespace = %self.config.namespace, "cache client in read-only mode");
            return Ok(CacheClient {
                reader,
                refresher: None,
                watched,
            });
        }

        let fetch = self
            .fetch
            .ok_or(ConfigurationError::MissingFetchCollaborator)?;

        let refresher = Arc::new(RefreshCoordinator::new(
            self.store.clone(),
            fetch,
            FilterChain::from_predicates(self.filters),
            self.config.retry_delay,
        ));

        for collection in &self.config.watched_collections {
            bus.subscribe(
                &topic(collection),
                common::GROUP,
                prime_request_handler(Arc::clone(&refresher), Arc::clone(&watched)),
            )
            .await?;
            tracing::info!(%collection, "watching collection");

            // Warm the entry so remote readers find it without a prime
            // round-trip. A failed warm is not fatal; the subscription will
            // serve later prime requests.
            if let Err(err) = refresher.refresh(collection, RefreshTrigger::Remote).await {
                tracing::warn!(%collection, error = %err, "initial warm refresh failed");
            }
        }

        Ok(CacheClient {
            reader,
            refresher: Some(refresher),
            watched,
        })
    }
}

/// Bus handler for prime requests: decode, scope-check, refresh. Failures
/// are logged here and never surfaced to the bus.
fn prime_request_handler<S>(
    refresher: Arc<RefreshCoordinator<S>>,
    watched: Arc<HashSet<CollectionKey>>,
) -> MessageHandler
where
    S: KeyValueStore + 'static,
{
    let handler: MessageHandler = Arc::new(move |payload: Vec<u8>| {
        let refresher = Arc::clone(&refresher);
        let watched = Arc::clone(&watched);
        Box::pin(async move {
            let request: PrimeRequest = match serde_json::from_slice(&payload) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(error = %err, "undecodable prime request dropped");
                    return;
                }
            };

            if !watched.contains(&request.collection) {
                tracing::debug!(collection = %request.collection, "prime request for unwatched collection ignored");
                return;
            }

            if let Err(err) = refresher
                .refresh(&request.collection, RefreshTrigger::Remote)
                .await
            {
                tracing::error!(collection = %request.collection, error = %err, "remote-triggered refresh failed");
            }
        })
    });
    handler
}

/// Per-process handle to the synchronized cache.
///
/// Explicitly constructed and passed by reference to every collaborator
/// that needs it; lifetime is managed by the caller, one handle per
/// process. Readers never write data back themselves: the owning process
/// refreshes on both its own mutations and remote prime requests.
pub struct CacheClient<S, B> {
    reader: SyncCoordinator<S, B>,
    refresher: Option<Arc<RefreshCoordinator<S>>>,
    watched: Arc<HashSet<CollectionKey>>,
}

impl<S, B> CacheClient<S, B>
where
    S: KeyValueStore + Clone + 'static,
    B: InvalidationBus,
{
    /// Starts building a client over the given store and bus handles.
    pub fn builder(store: S, bus: B, config: SyncConfig) -> CacheClientBuilder<S, B> {
        CacheClientBuilder {
            store,
            bus,
            config,
            filters: Vec::new(),
            fetch: None,
        }
    }

    /// Whether this process watches no collections and so never writes.
    pub fn is_read_only(&self) -> bool {
        self.refresher.is_none()
    }

    /// All records of `collection` whose `field` equals `value`. See
    /// [`SyncCoordinator::find_objects`].
    pub async fn find_objects(
        &self,
        collection: &CollectionKey,
        field: &str,
        value: &Record,
    ) -> Result<Vec<Record>> {
        self.reader.find_objects(collection, field, value).await
    }

    /// First record of `collection` whose `field` equals `value`.
    pub async fn find_object(
        &self,
        collection: &CollectionKey,
        field: &str,
        value: &Record,
    ) -> Result<Option<Record>> {
        self.reader.find_object(collection, field, value).await
    }

    /// The full snapshot of `collection`.
    pub async fn all_objects(&self, collection: &CollectionKey) -> Result<Vec<Record>> {
        self.reader.all_objects(collection).await
    }

    /// Lifecycle-hook entry point: refreshes the mutated collection and
    /// completes (or fails) before returning, since code downstream of the
    /// hook may depend on updated cache state.
    ///
    /// Mutations of unwatched collections, and any mutation in read-only
    /// mode, are ignored.
    #[tracing::instrument(skip(self, event), fields(collection = %event.collection, operation = %event.operation))]
    pub async fn notify_mutation(&self, event: MutationEvent) -> Result<()> {
        let Some(refresher) = &self.refresher else {
            tracing::debug!("mutation ignored, client is read-only");
            return Ok(());
        };

        if !self.watched.contains(&event.collection) {
            tracing::debug!("mutation for unwatched collection ignored");
            return Ok(());
        }

        refresher
            .refresh(
                &event.collection,
                RefreshTrigger::Local {
                    operation: event.operation,
                    record: event.record,
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bus::InMemoryBus;
    use common::Operation;
    use kv_store::InMemoryKeyValueStore;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::refresher::FetchError;

    /// Fetch double serving a fixed dataset per collection.
    struct StaticFetch {
        data: HashMap<String, Vec<Record>>,
    }

    impl StaticFetch {
        fn new(data: HashMap<String, Vec<Record>>) -> Arc<Self> {
            Arc::new(Self { data })
        }
    }

    #[async_trait]
    impl FetchCollaborator for StaticFetch {
        async fn load_all(
            &self,
            collection: &CollectionKey,
        ) -> std::result::Result<Vec<Record>, FetchError> {
            Ok(self.data.get(collection.as_str()).cloned().unwrap_or_default())
        }
    }

    fn fast_config(namespace: &str) -> SyncConfig {
        SyncConfig::new(namespace)
            .max_retries(5)
            .poll_interval(Duration::from_millis(10))
            .retry_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn invalid_config_fails_construction() {
        let result = CacheClient::builder(
            InMemoryKeyValueStore::new(),
            InMemoryBus::new(),
            SyncConfig::new(""),
        )
        .build()
        .await;

        assert!(matches!(
            result,
            Err(crate::SyncError::Configuration(
                ConfigurationError::EmptyNamespace
            ))
        ));
    }

    #[tokio::test]
    async fn watching_without_fetch_collaborator_fails_construction() {
        let result = CacheClient::builder(
            InMemoryKeyValueStore::new(),
            InMemoryBus::new(),
            fast_config("dev").watch(["Customer"]),
        )
        .build()
        .await;

        assert!(matches!(
            result,
            Err(crate::SyncError::Configuration(
                ConfigurationError::MissingFetchCollaborator
            ))
        ));
    }

    #[tokio::test]
    async fn read_only_client_ignores_mutations() {
        let client = CacheClient::builder(
            InMemoryKeyValueStore::new(),
            InMemoryBus::new(),
            fast_config("dev"),
        )
        .build()
        .await
        .unwrap();

        assert!(client.is_read_only());
        let outcome = client
            .notify_mutation(MutationEvent::new("Customer", Operation::Create, None))
            .await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn build_warms_watched_collections() {
        let store = InMemoryKeyValueStore::new();
        let fetch = StaticFetch::new(HashMap::from([(
            "Customer".to_string(),
            vec![json!({"id": 1, "name": "Ann"})],
        )]));

        let _client = CacheClient::builder(store.clone(), InMemoryBus::new(), {
            fast_config("dev").watch(["Customer"])
        })
        .fetch_collaborator(fetch)
        .build()
        .await
        .unwrap();

        let raw = store.get("Customer").await.unwrap().unwrap();
        let records: Vec<Record> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(records, vec![json!({"id": 1, "name": "Ann"})]);
    }

    #[tokio::test]
    async fn local_mutation_refreshes_the_store() {
        let store = InMemoryKeyValueStore::new();
        let fetch = StaticFetch::new(HashMap::from([(
            "Customer".to_string(),
            vec![json!({"id": 1}), json!({"id": 2})],
        )]));

        let client = CacheClient::builder(
            store.clone(),
            InMemoryBus::new(),
            fast_config("dev").watch(["Customer"]),
        )
        .fetch_collaborator(fetch)
        .build()
        .await
        .unwrap();

        client
            .notify_mutation(MutationEvent::new(
                "Customer",
                Operation::Update,
                Some(json!({"id": 2})),
            ))
            .await
            .unwrap();

        let raw = store.get("Customer").await.unwrap().unwrap();
        let records: Vec<Record> = serde_json::from_slice(&raw).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn mutation_for_unwatched_collection_is_ignored() {
        let store = InMemoryKeyValueStore::new();
        let fetch = StaticFetch::new(HashMap::from([(
            "Customer".to_string(),
            vec![json!({"id": 1})],
        )]));

        let client = CacheClient::builder(
            store.clone(),
            InMemoryBus::new(),
            fast_config("dev").watch(["Customer"]),
        )
        .fetch_collaborator(fetch)
        .build()
        .await
        .unwrap();

        client
            .notify_mutation(MutationEvent::new("Order", Operation::Create, None))
            .await
            .unwrap();

        assert_eq!(store.get("Order").await.unwrap(), None);
    }
}
