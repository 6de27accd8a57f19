use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{InvalidationBus, MessageHandler, Result};

/// Subscribers of one consumer group on one topic.
struct GroupState {
    handlers: Vec<MessageHandler>,
    cursor: usize,
}

/// In-memory bus implementation for testing.
///
/// Models the real channel's semantics: each subscribed group receives a
/// copy of every message, and within a group handlers compete round-robin
/// so exactly one of them gets each delivery. Handlers run on spawned
/// tasks, so delivery interleaves with the emitter's other work the way a
/// remote bus would.
///
/// Cloning yields a handle to the same bus. Emitted messages are recorded
/// so tests can assert on emission counts.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    topics: Arc<Mutex<HashMap<String, HashMap<String, GroupState>>>>,
    emitted: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl InMemoryBus {
    /// Creates a new bus with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many messages have been emitted on `topic`.
    pub async fn emitted_count(&self, topic: &str) -> usize {
        self.emitted
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t == topic)
            .count()
    }

    /// Returns the total number of emitted messages across all topics.
    pub async fn total_emitted(&self) -> usize {
        self.emitted.lock().await.len()
    }
}

#[async_trait]
impl InvalidationBus for InMemoryBus {
    async fn emit(&self, topic: &str, payload: &[u8]) -> Result<()> {
        self.emitted
            .lock()
            .await
            .push((topic.to_string(), payload.to_vec()));

        let mut topics = self.topics.lock().await;
        if let Some(groups) = topics.get_mut(topic) {
            for group in groups.values_mut() {
                // One delivery per group: competing consumers, round-robin.
                let index = group.cursor % group.handlers.len();
                group.cursor = group.cursor.wrapping_add(1);
                let handler = Arc::clone(&group.handlers[index]);
                let message = payload.to_vec();
                tokio::spawn(async move {
                    handler(message).await;
                });
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str, handler: MessageHandler) -> Result<()> {
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_default()
            .entry(group.to_string())
            .or_insert_with(|| GroupState {
                handlers: Vec::new(),
                cursor: 0,
            })
            .handlers
            .push(handler);
        Ok(())
    }
}
