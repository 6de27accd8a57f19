//! Demo process entry point.

mod config;
mod fixtures;

use std::sync::Arc;

use bus::RedisBus;
use common::CollectionKey;
use kv_store::RedisKeyValueStore;
use serde_json::json;
use sync::{CacheClient, SyncConfig};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;
use fixtures::DemoDataset;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, shutting down");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder (scrape endpoint on :9000)
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install()
        .expect("failed to install Prometheus recorder");

    // 3. Load configuration and connect the shared handles
    let config = Config::from_env();
    tracing::info!(?config, "starting cache sync process");

    let store = RedisKeyValueStore::connect(&config.redis_host, config.redis_port)
        .await
        .expect("failed to connect to redis store");
    let bus = RedisBus::connect(
        &config.redis_host,
        config.redis_port,
        config.bus_namespace.clone(),
    )
    .await
    .expect("failed to connect to redis bus");

    // 4. Build the cache client; owning processes warm and subscribe here
    let sync_config =
        SyncConfig::new(config.bus_namespace.clone()).watch(config.watched_collections.clone());
    let client = CacheClient::builder(store, bus, sync_config)
        .fetch_collaborator(Arc::new(DemoDataset::new()))
        .build()
        .await
        .expect("failed to build cache client");

    if client.is_read_only() {
        tracing::info!("running in read-only mode, no collections watched");
    }

    // 5. Exercise the read path once so the demo shows an end-to-end lookup
    match client
        .find_object(&CollectionKey::new("Customer"), "id", &json!(1))
        .await
    {
        Ok(Some(customer)) => tracing::info!(%customer, "demo lookup resolved"),
        Ok(None) => tracing::info!("demo lookup found no customer with id 1"),
        Err(err) => tracing::warn!(error = %err, "demo lookup failed"),
    }

    // 6. Serve refreshes until shutdown
    shutdown_signal().await;
    tracing::info!("shut down gracefully");
}
