//! Read path: lazy priming with bounded polling.

use std::sync::Arc;
use std::time::Duration;

use bus::InvalidationBus;
use common::{CollectionKey, PrimeRequest, Record, topic};
use kv_store::KeyValueStore;

use crate::Result;

/// Read-path coordinator.
///
/// On a cache miss it cannot know *when* a refresh will land, only *that*
/// it asked: it emits one prime request on the bus, then blindly re-checks
/// the store at a fixed interval. The retry ceiling bounds worst-case
/// latency and guarantees termination; exhaustion resolves to an empty
/// result, never an error, because absent data is an expected outcome.
///
/// Concurrent readers missing on the same collection each emit their own
/// prime request. That is harmless: a refresh is a full-snapshot overwrite,
/// so duplicate requests are idempotent.
pub struct SyncCoordinator<S, B> {
    store: S,
    bus: Arc<B>,
    max_retries: u32,
    poll_interval: Duration,
}

impl<S, B> SyncCoordinator<S, B>
where
    S: KeyValueStore,
    B: InvalidationBus,
{
    /// Creates a read-path coordinator over the given store and bus.
    pub fn new(store: S, bus: Arc<B>, max_retries: u32, poll_interval: Duration) -> Self {
        Self {
            store,
            bus,
            max_retries,
            poll_interval,
        }
    }

    /// Returns all records of `collection` whose `field` equals `value`.
    ///
    /// Exact value equality; records lacking the field never match. A
    /// collection that never gets primed resolves to an empty vec.
    #[tracing::instrument(skip(self, value))]
    pub async fn find_objects(
        &self,
        collection: &CollectionKey,
        field: &str,
        value: &Record,
    ) -> Result<Vec<Record>> {
        let snapshot = self.load_snapshot(collection).await?;
        Ok(snapshot
            .into_iter()
            .filter(|record| record.get(field) == Some(value))
            .collect())
    }

    /// Returns the first record of `collection` whose `field` equals
    /// `value`, or `None`.
    pub async fn find_object(
        &self,
        collection: &CollectionKey,
        field: &str,
        value: &Record,
    ) -> Result<Option<Record>> {
        Ok(self
            .find_objects(collection, field, value)
            .await?
            .into_iter()
            .next())
    }

    /// Returns the full snapshot of `collection`.
    #[tracing::instrument(skip(self))]
    pub async fn all_objects(&self, collection: &CollectionKey) -> Result<Vec<Record>> {
        self.load_snapshot(collection).await
    }

    /// The CHECK → WAIT_PRIME → POLL loop, carrying the attempt count as
    /// data so the termination bound is visible.
    async fn load_snapshot(&self, collection: &CollectionKey) -> Result<Vec<Record>> {
        let mut attempt: u32 = 0;
        loop {
            // CHECK
            if let Some(raw) = self.store.get(collection.as_str()).await?
                && !raw.is_empty()
            {
                return Ok(serde_json::from_slice(&raw)?);
            }

            if attempt == 0 {
                // WAIT_PRIME: ask an owner to reload this collection. An
                // emit failure propagates; priming cannot proceed without
                // the bus.
                let payload = serde_json::to_vec(&PrimeRequest::new(collection.clone()))?;
                self.bus.emit(&topic(collection), &payload).await?;
                metrics::counter!("cache_prime_requests_total").increment(1);
                tracing::debug!(%collection, "prime request emitted, waiting for refresh");
            } else if attempt >= self.max_retries {
                tracing::debug!(%collection, attempts = attempt, "prime retries exhausted, returning empty");
                return Ok(Vec::new());
            } else {
                // POLL
                tracing::debug!(%collection, attempt, "cache still empty, waiting");
            }

            attempt += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
