//! Synchronization protocol configuration.

use std::time::Duration;

use common::CollectionKey;
use thiserror::Error;

/// How many times the read path re-checks the store after asking for a
/// prime before giving up and returning an empty result.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// How long the read path waits between store checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1_000);

/// How long the write path waits before its single retry.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Invalid construction-time options. Raised immediately, never ignored.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("watched collection keys must not be empty strings")]
    EmptyCollectionKey,

    #[error("a fetch collaborator is required when collections are watched")]
    MissingFetchCollaborator,

    #[error("max_retries must be at least 1")]
    ZeroMaxRetries,
}

/// Protocol knobs for one client handle.
///
/// `watched_collections` decides the process role: an empty list means
/// read-only mode (no subscriptions, no write path); a non-empty list makes
/// this process an owner that refreshes those collections on local
/// mutations and remote prime requests.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Bus namespace, so several environments can share one backend.
    pub namespace: String,
    /// Collections this process owns and refreshes.
    pub watched_collections: Vec<CollectionKey>,
    /// Read-path retry ceiling.
    pub max_retries: u32,
    /// Read-path wait between store checks.
    pub poll_interval: Duration,
    /// Write-path wait before the single retry.
    pub retry_delay: Duration,
}

impl SyncConfig {
    /// Creates a read-only configuration with default timing.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            watched_collections: Vec::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Declares the collections this process owns.
    pub fn watch(mut self, collections: impl IntoIterator<Item = impl Into<CollectionKey>>) -> Self {
        self.watched_collections = collections.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Checks the plain-data invariants. The builder performs the checks
    /// that need the runtime collaborators as well.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.namespace.is_empty() {
            return Err(ConfigurationError::EmptyNamespace);
        }
        if self.max_retries == 0 {
            return Err(ConfigurationError::ZeroMaxRetries);
        }
        if self
            .watched_collections
            .iter()
            .any(|c| c.as_str().is_empty())
        {
            return Err(ConfigurationError::EmptyCollectionKey);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_constants() {
        let config = SyncConfig::new("dev");
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.poll_interval, Duration::from_millis(1_000));
        assert_eq!(config.retry_delay, Duration::from_millis(1_000));
        assert!(config.watched_collections.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_namespace_is_rejected() {
        let config = SyncConfig::new("");
        assert_eq!(config.validate(), Err(ConfigurationError::EmptyNamespace));
    }

    #[test]
    fn zero_max_retries_is_rejected() {
        let config = SyncConfig::new("dev").max_retries(0);
        assert_eq!(config.validate(), Err(ConfigurationError::ZeroMaxRetries));
    }

    #[test]
    fn empty_collection_key_is_rejected() {
        let config = SyncConfig::new("dev").watch(["Customer", ""]);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::EmptyCollectionKey)
        );
    }

    #[test]
    fn watch_collects_keys() {
        let config = SyncConfig::new("dev").watch(["Customer", "Order"]);
        assert_eq!(config.watched_collections.len(), 2);
        assert_eq!(config.watched_collections[0].as_str(), "Customer");
    }
}
