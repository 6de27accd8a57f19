//! Shared types for the cache synchronization system.

pub mod topic;
pub mod types;

pub use topic::{GROUP, SEP, topic};
pub use types::{CollectionKey, MutationEvent, Operation, PrimeRequest, Record};
