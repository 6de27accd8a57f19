//! Key/value store contract and backends.
//!
//! This crate provides the storage seam everything else builds on:
//! - [`KeyValueStore`] trait for get/set/delete against a remote backend
//! - [`RedisKeyValueStore`] for production use
//! - [`InMemoryKeyValueStore`] for testing

pub mod error;
pub mod memory;
pub mod redis;
pub mod store;

pub use error::{BackendError, Result};
pub use memory::InMemoryKeyValueStore;
pub use redis::RedisKeyValueStore;
pub use store::KeyValueStore;
