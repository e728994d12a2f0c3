//! Storage side of stowage.
//!
//! A [`Backend`] is a raw hash-oriented key-value store (read all fields,
//! atomic command batches, delete). [`EntryStore`] maps cache entries onto
//! it under `prefix + fingerprint`. If you want to plug in your own store,
//! implementing [`Backend`] is all it takes.
mod backend;
pub mod command;
pub mod entry;
mod error;
pub mod memory;
pub mod metrics;
mod store;

pub use backend::{Backend, BackendResult};
pub use command::{Batch, Command};
pub use entry::{CacheEntry, EntryResponse, StoredEntry};
pub use error::{BackendError, StoreError};
pub use memory::MemoryBackend;
pub use store::{DEFAULT_KEY_PREFIX, EntryStore};

/// Status of deleting result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Number of keys removed.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
