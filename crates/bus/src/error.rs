use thiserror::Error;

/// Errors that can occur when interacting with the invalidation bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// A connectivity or protocol failure from the remote bus backend.
    #[error("Bus backend error: {0}")]
    Connection(#[from] redis::RedisError),

    /// A delivered message did not carry the expected payload field.
    #[error("Malformed bus message: {0}")]
    MalformedMessage(String),
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
