use thiserror::Error;

/// Errors that can occur when talking to the key/value backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A connectivity or protocol failure from the remote store.
    #[error("Store backend error: {0}")]
    Connection(#[from] redis::RedisError),

    /// The backend returned a payload the caller cannot use.
    #[error("Unexpected backend reply: {0}")]
    UnexpectedReply(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, BackendError>;
