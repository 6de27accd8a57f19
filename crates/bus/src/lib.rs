//! Invalidation bus contract and backends.
//!
//! The bus is the asynchronous signaling channel between processes:
//! - [`InvalidationBus`] trait for emit/subscribe with consumer groups
//! - [`RedisBus`] for production use (Redis Streams consumer groups)
//! - [`InMemoryBus`] for testing

pub mod error;
pub mod memory;
pub mod redis;
pub mod traits;

pub use error::{BusError, Result};
pub use memory::InMemoryBus;
pub use redis::RedisBus;
pub use traits::{InvalidationBus, MessageHandler};
