//! Cache entries on top of a raw [`Backend`].

use std::sync::Arc;

use bytes::Bytes;
use smol_str::SmolStr;
use stowage_core::CachedResponse;
use tokio::runtime::Handle;
use tracing::{Instrument, debug, info_span, trace, warn};

use crate::entry::{CacheEntry, EntryResponse, PARSED_FIELD, RAW_FIELD, RESPONSE_FIELD, StoredEntry};
use crate::metrics::{self, ReadOutcome, Timer};
use crate::{Backend, Batch, Command, DeleteStatus, StoreError};

/// Key prefix used when none is configured.
pub const DEFAULT_KEY_PREFIX: &str = "stowage:";

/// Reads and writes [`CacheEntry`]s stored under `prefix + fingerprint`.
///
/// Store errors are returned as they are, without retries.
#[derive(Clone)]
pub struct EntryStore {
    backend: Arc<dyn Backend>,
    prefix: SmolStr,
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("backend", &self.backend.label())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl EntryStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_prefix(backend, DEFAULT_KEY_PREFIX)
    }

    pub fn with_prefix(backend: Arc<dyn Backend>, prefix: impl AsRef<str>) -> Self {
        Self {
            backend,
            prefix: SmolStr::new(prefix.as_ref()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Store key for a fingerprint.
    pub fn key(&self, fingerprint: &str) -> String {
        format!("{}{}", self.prefix, fingerprint)
    }

    /// Reads the entry stored under `fingerprint`.
    ///
    /// A hash without a `response` field is corrupt: its key is deleted in
    /// the background and [`StoreError::CorruptEntry`] is returned right
    /// away. A failing cleanup is only logged.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<StoredEntry>, StoreError> {
        let key = self.key(fingerprint);
        let label = self.backend.label();
        let timer = Timer::new();

        let mut fields = match self.backend.read(&key).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                trace!(key = %key, "Cache miss");
                metrics::record_read(label, ReadOutcome::Miss, timer.elapsed());
                return Ok(None);
            }
            Err(error) => {
                metrics::record_error(label, "read");
                return Err(error.into());
            }
        };

        let Some(response) = fields.remove(RESPONSE_FIELD) else {
            warn!(key = %key, "Cache entry without response field, purging");
            metrics::record_read(label, ReadOutcome::Corrupt, timer.elapsed());
            self.spawn_purge(key.clone());
            return Err(StoreError::CorruptEntry { key });
        };

        let response: CachedResponse = match serde_json::from_slice(&response) {
            Ok(response) => response,
            Err(error) => {
                metrics::record_error(label, "read");
                return Err(error.into());
            }
        };
        metrics::record_read(label, ReadOutcome::Hit, timer.elapsed());
        debug!(key = %key, status = %response.status(), "Cache hit");

        Ok(Some(StoredEntry {
            response,
            raw: fields.remove(RAW_FIELD),
            parsed: fields.remove(PARSED_FIELD),
        }))
    }

    /// Writes the non-empty parts of `entry` under `fingerprint`.
    ///
    /// The fields and the optional expiry go to the backend as one atomic
    /// batch. An entry with only an expiry refreshes the TTL of the stored
    /// key. An entry with neither never reaches the backend.
    pub async fn put(&self, fingerprint: &str, entry: CacheEntry) -> Result<(), StoreError> {
        let key = self.key(fingerprint);
        let label = self.backend.label();

        let mut fields: Vec<(String, Bytes)> = Vec::with_capacity(3);
        if let Some(response) = entry.response {
            let response = match response {
                EntryResponse::Structured(response) => {
                    serde_json::to_string(&CachedResponse::from_response(&response))?
                }
                EntryResponse::Serialized(response) => response,
            };
            if !response.is_empty() {
                fields.push((RESPONSE_FIELD.to_owned(), Bytes::from(response)));
            }
        }
        for (name, value) in [(RAW_FIELD, entry.raw), (PARSED_FIELD, entry.parsed)] {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                fields.push((name.to_owned(), value));
            }
        }

        let mut batch = Batch::new();
        if !fields.is_empty() {
            batch = batch.hash_set(fields);
        }
        if let Some(at) = entry.expire_at {
            batch = batch.expire_at(at);
        }
        if batch.is_empty() {
            debug!(key = %key, "Nothing to write");
            return Ok(());
        }
        let timer = Timer::new();
        match self.backend.execute(&key, batch).await {
            Ok(()) => {
                metrics::record_write(label, timer.elapsed());
                debug!(key = %key, expire_at = ?entry.expire_at, "Cache entry written");
                Ok(())
            }
            Err(error) => {
                metrics::record_error(label, "write");
                Err(error.into())
            }
        }
    }

    /// Runs one arbitrary command against the key of `fingerprint`.
    pub async fn put_with_command(
        &self,
        command: Command,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        let key = self.key(fingerprint);
        trace!(key = %key, ?command, "Executing store command");
        self.backend
            .execute(&key, command.into())
            .await
            .map_err(|error| {
                warn!(key = %key, %error, "Store command failed");
                metrics::record_error(self.backend.label(), "command");
                error.into()
            })
    }

    /// Deletes the entry of `fingerprint`.
    ///
    /// Returns `true` only when exactly one key was removed.
    pub async fn purge(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let key = self.key(fingerprint);
        let label = self.backend.label();
        match self.backend.remove(&key).await {
            Ok(status) => {
                let deleted = status == DeleteStatus::Deleted(1);
                metrics::record_purge(label, deleted);
                debug!(key = %key, ?status, "Cache entry purged");
                Ok(deleted)
            }
            Err(error) => {
                metrics::record_error(label, "purge");
                Err(error.into())
            }
        }
    }

    fn spawn_purge(&self, key: String) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(key = %key, "No async runtime, corrupt cache entry left in place");
            return;
        };
        let backend = self.backend.clone();
        let span = info_span!("purge_corrupt_entry", key = %key);
        runtime.spawn(
            async move {
                match backend.remove(&key).await {
                    Ok(status) => debug!(?status, "Corrupt cache entry removed"),
                    Err(error) => warn!(%error, "Failed to remove corrupt cache entry"),
                }
            }
            .instrument(span),
        );
    }
}
