use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};

use crate::{InvalidationBus, MessageHandler, Result};

/// Field under which the message payload travels in a stream entry.
const PAYLOAD_FIELD: &str = "payload";

/// How long one XREADGROUP call blocks waiting for entries, in milliseconds.
const BLOCK_MS: usize = 5_000;

/// How many entries to pull per XREADGROUP call.
const READ_COUNT: usize = 16;

static CONSUMER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Redis Streams bus implementation.
///
/// Topics map to streams, consumer groups to stream groups, so competing
/// consumers come from the backend itself: `XREADGROUP` hands each entry to
/// one member of a group and `XACK` confirms it. Each subscription runs a
/// spawned consumer loop on its own connection, keeping long blocking reads
/// off the shared emit connection.
///
/// Streams are namespaced as `<namespace>.<topic>` so several environments
/// can share one Redis instance.
#[derive(Clone)]
pub struct RedisBus {
    client: Client,
    emit_conn: ConnectionManager,
    namespace: String,
}

impl RedisBus {
    /// Connects to the Redis instance at `host:port`, scoping all streams
    /// under `namespace`.
    pub async fn connect(host: &str, port: u16, namespace: impl Into<String>) -> Result<Self> {
        let client = Client::open(format!("redis://{host}:{port}"))?;
        let emit_conn = ConnectionManager::new(client.clone()).await?;
        let namespace = namespace.into();
        tracing::info!(host, port, %namespace, "connected to redis bus");
        Ok(Self {
            client,
            emit_conn,
            namespace,
        })
    }

    fn stream_key(&self, topic: &str) -> String {
        if self.namespace.is_empty() {
            topic.to_string()
        } else {
            format!("{}.{}", self.namespace, topic)
        }
    }

    /// Unique-enough consumer name for one subscription of this process.
    fn consumer_name() -> String {
        format!(
            "{}-{}",
            std::process::id(),
            CONSUMER_SEQ.fetch_add(1, Ordering::Relaxed)
        )
    }
}

#[async_trait]
impl InvalidationBus for RedisBus {
    async fn emit(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let key = self.stream_key(topic);
        let mut conn = self.emit_conn.clone();
        let id: String = conn
            .xadd(&key, "*", &[(PAYLOAD_FIELD, payload)])
            .await
            .inspect_err(|err| {
                tracing::error!(topic, error = %err, "bus emit failed");
            })?;
        tracing::debug!(topic, %id, "bus message emitted");
        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str, handler: MessageHandler) -> Result<()> {
        let key = self.stream_key(topic);
        let mut conn = ConnectionManager::new(self.client.clone()).await?;

        // Ensure the group exists; BUSYGROUP means another process already
        // created it, which is the normal case.
        let created: redis::RedisResult<()> =
            conn.xgroup_create_mkstream(&key, group, "$").await;
        if let Err(err) = created {
            if err.code() != Some("BUSYGROUP") {
                return Err(err.into());
            }
        }

        let consumer = Self::consumer_name();
        let group = group.to_string();
        let topic = topic.to_string();
        tracing::info!(%topic, %group, %consumer, "bus subscription started");

        tokio::spawn(async move {
            let options = StreamReadOptions::default()
                .group(&group, &consumer)
                .block(BLOCK_MS)
                .count(READ_COUNT);

            loop {
                let reply: redis::RedisResult<StreamReadReply> =
                    conn.xread_options(&[&key], &[">"], &options).await;

                let reply = match reply {
                    Ok(reply) => reply,
                    Err(err) => {
                        tracing::warn!(%topic, error = %err, "bus read failed, backing off");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                };

                for stream in reply.keys {
                    for entry in stream.ids {
                        match entry.map.get(PAYLOAD_FIELD) {
                            Some(value) => match redis::from_redis_value::<Vec<u8>>(value) {
                                Ok(bytes) => handler(bytes).await,
                                Err(err) => {
                                    tracing::warn!(%topic, id = %entry.id, error = %err, "undecodable bus payload dropped");
                                }
                            },
                            None => {
                                tracing::warn!(%topic, id = %entry.id, "bus entry without payload field dropped");
                            }
                        }

                        // Ack regardless: a poison entry must not be redelivered forever.
                        let acked: redis::RedisResult<()> =
                            conn.xack(&key, &group, &[&entry.id]).await;
                        if let Err(err) = acked {
                            tracing::warn!(%topic, id = %entry.id, error = %err, "bus ack failed");
                        }
                    }
                }
            }
        });

        Ok(())
    }
}
