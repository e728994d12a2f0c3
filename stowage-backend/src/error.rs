use thiserror::Error;

/// Describes general groups of errors in backend interaction.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not bounded with network interaction.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
    /// Network interaction error.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send + Sync>),
    /// Command applied to a key holding another kind of value.
    #[error("operation against key `{key}` holding the wrong kind of value")]
    WrongType { key: String },
}

/// Errors returned by [`EntryStore`](crate::EntryStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed; reported verbatim.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The stored hash has no `response` field.
    ///
    /// A cleanup delete of the key has been scheduled.
    #[error("cache entry `{key}` has no response field")]
    CorruptEntry { key: String },
    /// The `response` field could not be encoded or decoded.
    #[error(transparent)]
    Format(#[from] serde_json::Error),
}
