//! Cache entry as written to and read from the store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use stowage_core::{CacheableResponse, CachedResponse};

/// Hash field holding the response JSON.
pub const RESPONSE_FIELD: &str = "response";
/// Hash field holding the caller's raw payload.
pub const RAW_FIELD: &str = "raw";
/// Hash field holding the caller's parsed payload.
pub const PARSED_FIELD: &str = "parsed";

/// Response part of a [`CacheEntry`].
#[derive(Debug, Clone)]
pub enum EntryResponse {
    /// Projected onto [`CachedResponse`] and encoded as JSON on write.
    Structured(CacheableResponse),
    /// Written verbatim.
    Serialized(String),
}

impl From<CacheableResponse> for EntryResponse {
    fn from(response: CacheableResponse) -> Self {
        Self::Structured(response)
    }
}

impl From<String> for EntryResponse {
    fn from(response: String) -> Self {
        Self::Serialized(response)
    }
}

/// Entry to be written under a fingerprint.
///
/// Every part is optional; only the non-empty ones are written.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub response: Option<EntryResponse>,
    pub raw: Option<Bytes>,
    pub parsed: Option<Bytes>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(mut self, response: impl Into<EntryResponse>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn raw(mut self, raw: impl Into<Bytes>) -> Self {
        self.raw = Some(raw.into());
        self
    }

    pub fn parsed(mut self, parsed: impl Into<Bytes>) -> Self {
        self.parsed = Some(parsed.into());
        self
    }

    pub fn expire_at(mut self, at: DateTime<Utc>) -> Self {
        self.expire_at = Some(at);
        self
    }
}

/// Entry read back from the store.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub response: CachedResponse,
    pub raw: Option<Bytes>,
    pub parsed: Option<Bytes>,
}
