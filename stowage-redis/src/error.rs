//! Error types for Redis backend operations.
//!
//! Every error converts into [`BackendError`] so the entry store can report
//! it without knowing about Redis.
//!
//! [`BackendError`]: stowage_backend::BackendError

use redis::RedisError;
use stowage_backend::BackendError;

/// Error type for Redis backend operations.
///
/// # When You'll Encounter This
///
/// - Building a backend from an invalid connection URL
/// - Building a backend without any connection mode or client
/// - Running a command while Redis is unreachable (the connection is
///   established lazily on first use)
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying Redis client.
    #[error("Redis backend error: {0}")]
    Redis(#[from] RedisError),

    /// Neither a connection mode nor a client was given to the builder.
    #[error("Connection mode not specified. Call .connection() or .client() before .build()")]
    MissingConnectionMode,
}

impl From<Error> for BackendError {
    fn from(error: Error) -> Self {
        match error {
            Error::Redis(error) if error.is_io_error() => Self::ConnectionError(Box::new(error)),
            error => Self::InternalError(Box::new(error)),
        }
    }
}
