//! Write path: filtered full-snapshot refresh with one bounded retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{CollectionKey, Operation, Record};
use kv_store::KeyValueStore;
use thiserror::Error;

use crate::filter::FilterChain;
use crate::{Result, SyncError};

/// Failure reported by the host's fetch collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FetchError {
    message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host-supplied loader for the authoritative, complete current set of
/// records of one collection. Any error it reports is treated as a refresh
/// failure and goes through the retry policy.
#[async_trait]
pub trait FetchCollaborator: Send + Sync {
    async fn load_all(
        &self,
        collection: &CollectionKey,
    ) -> std::result::Result<Vec<Record>, FetchError>;
}

/// What caused a refresh: a local lifecycle hook or a remote prime request.
///
/// Both origins flow through the same refresh logic; a remote request
/// carries no operation or record, so the filter chain evaluates it as a
/// create with no record.
#[derive(Debug, Clone)]
pub enum RefreshTrigger {
    Local {
        operation: Operation,
        record: Option<Record>,
    },
    Remote,
}

impl RefreshTrigger {
    fn operation(&self) -> Operation {
        match self {
            RefreshTrigger::Local { operation, .. } => *operation,
            RefreshTrigger::Remote => Operation::Create,
        }
    }

    fn record(&self) -> Option<&Record> {
        match self {
            RefreshTrigger::Local { record, .. } => record.as_ref(),
            RefreshTrigger::Remote => None,
        }
    }

    fn origin(&self) -> &'static str {
        match self {
            RefreshTrigger::Local { .. } => "local",
            RefreshTrigger::Remote => "remote",
        }
    }
}

/// Write-path coordinator.
///
/// A refresh re-loads the full current dataset of one collection and
/// overwrites the stored snapshot; it never merges with previous contents.
/// An empty dataset deletes the key instead of storing an empty snapshot,
/// so a stored entry is always non-empty and complete as of some write.
///
/// On failure the refresh waits a fixed delay and retries exactly once; a
/// second failure is treated as a real outage and surfaced. No exponential
/// backoff: one quick retry recovers a transient blip without a retry
/// storm.
pub struct RefreshCoordinator<S> {
    store: S,
    fetch: Arc<dyn FetchCollaborator>,
    filters: FilterChain,
    retry_delay: Duration,
}

impl<S: KeyValueStore> RefreshCoordinator<S> {
    /// Creates a write-path coordinator over the given store.
    pub fn new(
        store: S,
        fetch: Arc<dyn FetchCollaborator>,
        filters: FilterChain,
        retry_delay: Duration,
    ) -> Self {
        Self {
            store,
            fetch,
            filters,
            retry_delay,
        }
    }

    /// Re-loads and stores the snapshot of `collection`, unless the filter
    /// chain suppresses the trigger.
    #[tracing::instrument(skip(self, trigger), fields(origin = trigger.origin()))]
    pub async fn refresh(&self, collection: &CollectionKey, trigger: RefreshTrigger) -> Result<()> {
        if !self
            .filters
            .should_refresh(collection, trigger.operation(), trigger.record())
        {
            tracing::debug!(%collection, operation = %trigger.operation(), "refresh suppressed by filter chain");
            return Ok(());
        }

        let started = std::time::Instant::now();
        let first_failure = match self.reload_and_store(collection).await {
            Ok(count) => {
                self.record_success(collection, count, started);
                return Ok(());
            }
            Err(err) => err,
        };

        metrics::counter!("cache_refresh_failures_total").increment(1);
        tracing::warn!(%collection, error = %first_failure, "refresh failed, retrying once");
        tokio::time::sleep(self.retry_delay).await;

        match self.reload_and_store(collection).await {
            Ok(count) => {
                self.record_success(collection, count, started);
                Ok(())
            }
            Err(err) => {
                metrics::counter!("cache_refresh_failures_total").increment(1);
                tracing::error!(%collection, error = %err, "refresh failed after retry, giving up");
                Err(err)
            }
        }
    }

    /// One fetch-and-overwrite attempt. A failed fetch leaves the store
    /// untouched.
    async fn reload_and_store(&self, collection: &CollectionKey) -> Result<usize> {
        let records = self
            .fetch
            .load_all(collection)
            .await
            .map_err(|source| SyncError::Fetch {
                collection: collection.clone(),
                source,
            })?;

        let count = records.len();
        if records.is_empty() {
            self.store.delete(collection.as_str()).await?;
        } else {
            let blob = serde_json::to_vec(&records)?;
            self.store.set(collection.as_str(), blob).await?;
        }
        Ok(count)
    }

    fn record_success(&self, collection: &CollectionKey, count: usize, started: std::time::Instant) {
        metrics::counter!("cache_refreshes_total").increment(1);
        metrics::histogram!("cache_refresh_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(%collection, records = count, "snapshot refreshed");
    }
}
