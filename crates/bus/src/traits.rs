use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::Result;

/// Callback invoked once per delivered message.
///
/// The handler owns reporting of its own failures: it logs and swallows
/// them rather than raising them back into the bus, so a bad message never
/// takes the subscription down.
pub type MessageHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Core trait for publish/subscribe bus backends.
///
/// Delivery is at-least-once with no ordering guarantee across topics.
/// `group` implements competing-consumers semantics: when several
/// subscribers share a group on a topic, each message reaches exactly one
/// of them, which is what decides who performs a given refresh.
#[async_trait]
pub trait InvalidationBus: Send + Sync {
    /// Publishes `payload` on `topic`.
    ///
    /// Failures propagate to the caller; the bus does not retry.
    async fn emit(&self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Registers `handler` for messages on `topic` within `group`.
    ///
    /// The subscription lives for the rest of the process; there is no
    /// unsubscribe.
    async fn subscribe(&self, topic: &str, group: &str, handler: MessageHandler) -> Result<()>;
}
