use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Batch, BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw hash-oriented key-value store.
///
/// Keys are full store keys; prefixing is the caller's concern.
#[async_trait]
pub trait Backend: Sync + Send {
    /// All fields of the hash stored at `key`.
    ///
    /// A missing key and an empty hash both read as `None`.
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>>;

    /// Applies every command of `batch` to `key` as one atomic unit.
    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()>;

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus>;

    /// Short name used in logs and metric labels.
    fn label(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        (**self).read(key).await
    }

    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()> {
        (**self).execute(key, batch).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        (**self).read(key).await
    }

    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()> {
        (**self).execute(key, batch).await
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
