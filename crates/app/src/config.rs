//! Application configuration loaded from environment variables.

/// Process configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `REDIS_HOST` — store/bus host (default: `"127.0.0.1"`)
/// - `REDIS_PORT` — store/bus port (default: `6379`)
/// - `BUS_NAMESPACE` — namespace prefix for bus topics (default: `"dev"`)
/// - `WATCHED_COLLECTIONS` — comma-separated collections this process owns
///   (default: empty, read-only mode)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub bus_namespace: String,
    pub watched_collections: Vec<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            redis_host: std::env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            redis_port: std::env::var("REDIS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(6379),
            bus_namespace: std::env::var("BUS_NAMESPACE").unwrap_or_else(|_| "dev".to_string()),
            watched_collections: std::env::var("WATCHED_COLLECTIONS")
                .map(|raw| parse_collections(&raw))
                .unwrap_or_default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            bus_namespace: "dev".to_string(),
            watched_collections: Vec::new(),
        }
    }
}

fn parse_collections(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
