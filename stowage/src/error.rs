use stowage_backend::BackendError;
use thiserror::Error;

/// Malformed or incomplete cache configuration.
///
/// Raised while building a [`Cache`](crate::Cache); a cache is never
/// constructed from an invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_saphyr::Error),
    /// Neither a backend instance nor backend parameters were given.
    #[error("No backend configured")]
    MissingBackend,
    /// The configured backend was compiled out.
    #[error("Backend not available: {0}. Enable the corresponding cargo feature")]
    BackendNotAvailable(String),
    /// The backend client could not be created.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
