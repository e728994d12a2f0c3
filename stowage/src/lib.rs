#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cache;

/// YAML configuration and backend selection.
///
/// [`CacheConfig`] mirrors the builder switches; [`BackendConfig`] picks the
/// store the cache talks to.
pub mod config;

mod error;

pub use cache::{Cache, CacheBuilder};
pub use config::{BackendConfig, CacheConfig, RedisConfig};
pub use error::ConfigError;

pub use stowage_core::{
    CacheControl, CacheableRequest, CacheableResponse, CachedResponse, Decision, Evaluator,
    Fingerprint, Fingerprinter, GlobalPolicy, HostRegistry, PolicyOverrides, PolicyResolver,
    RequestValidator, ResolvedPolicy, ResponseValidator, Validator, Verdict,
};

pub use stowage_backend::{
    Backend, BackendError, Batch, CacheEntry, Command, DeleteStatus, EntryResponse, EntryStore,
    MemoryBackend, StoreError, StoredEntry,
};

/// Validator building blocks.
pub mod validator {
    pub use stowage_core::validator::*;
}

/// Redis backend, re-exported from `stowage-redis`.
#[cfg(feature = "redis")]
#[cfg_attr(docsrs, doc(cfg(feature = "redis")))]
pub mod redis {
    pub use stowage_redis::*;
}
