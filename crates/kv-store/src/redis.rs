use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::{KeyValueStore, Result};

/// Redis-backed key/value store.
///
/// Uses a [`ConnectionManager`], a multiplexed connection that reconnects on
/// failure, so one long-lived handle per process serves every operation.
/// Cloning is cheap and shares the underlying connection.
#[derive(Clone)]
pub struct RedisKeyValueStore {
    conn: ConnectionManager,
}

impl RedisKeyValueStore {
    /// Connects to the Redis instance at `host:port`.
    ///
    /// Fails fast on an unreachable backend; steady-state connection drops
    /// are retried by the connection manager itself.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let client = Client::open(format!("redis://{host}:{port}"))?;
        let conn = ConnectionManager::new(client).await?;
        tracing::info!(host, port, "connected to redis store");
        Ok(Self { conn })
    }

    /// Wraps an already-established connection manager.
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await.inspect_err(|err| {
            tracing::error!(key, error = %err, "redis GET failed");
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.conn.clone();
        let () = conn.set(key, value).await.inspect_err(|err| {
            tracing::error!(key, error = %err, "redis SET failed");
        })?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let () = conn.del(key).await.inspect_err(|err| {
            tracing::error!(key, error = %err, "redis DEL failed");
        })?;
        Ok(())
    }
}
