use common::CollectionKey;
use thiserror::Error;

use crate::config::ConfigurationError;
use crate::refresher::FetchError;

/// Errors that can occur in the synchronization core.
///
/// Read-path exhaustion is deliberately not here: a collection that never
/// gets primed resolves to an empty result, because absence of data is an
/// expected outcome, not a failure.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The key/value store reported a connectivity or protocol failure.
    #[error("Store error: {0}")]
    Backend(#[from] kv_store::BackendError),

    /// The invalidation bus reported a connectivity or protocol failure.
    #[error("Bus error: {0}")]
    Bus(#[from] bus::BusError),

    /// A snapshot or wire message failed to (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The client was constructed with invalid options. Fatal.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The fetch collaborator failed to reload a collection.
    #[error("Fetch failed for collection {collection}: {source}")]
    Fetch {
        collection: CollectionKey,
        #[source]
        source: FetchError,
    },
}

/// Result type for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;
