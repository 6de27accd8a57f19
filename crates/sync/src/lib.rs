//! Cache synchronization core.
//!
//! Keeps a shared, process-external key/value store synchronized with a
//! system-of-record dataset across uncoordinated processes:
//! - [`SyncCoordinator`] — the read path: on a cache miss it emits a prime
//!   request on the bus, then polls the store with bounded retries
//! - [`RefreshCoordinator`] — the write path: full-snapshot reload and
//!   overwrite, gated by a [`FilterChain`], with one fixed-delay retry
//! - [`CacheClient`] — dependency-injected handle wiring both paths plus
//!   the per-collection bus subscriptions

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod reader;
pub mod refresher;

pub use client::{CacheClient, CacheClientBuilder};
pub use config::{ConfigurationError, SyncConfig};
pub use error::{Result, SyncError};
pub use filter::{FilterChain, FilterPredicate};
pub use reader::SyncCoordinator;
pub use refresher::{FetchCollaborator, FetchError, RefreshCoordinator, RefreshTrigger};
