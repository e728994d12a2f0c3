use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use http::header::{CONTENT_TYPE, DATE, SET_COOKIE};
use http::{HeaderValue, StatusCode};
use stowage_backend::{
    Backend, BackendError, BackendResult, Batch, CacheEntry, Command, DeleteStatus, EntryStore,
    MemoryBackend, StoreError,
};
use stowage_core::CacheableResponse;

/// Delegates reads and writes to a [`MemoryBackend`], fails every delete.
#[derive(Clone, Default)]
struct UndeletableBackend {
    inner: MemoryBackend,
}

#[async_trait]
impl Backend for UndeletableBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        self.inner.read(key).await
    }

    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()> {
        self.inner.execute(key, batch).await
    }

    async fn remove(&self, _key: &str) -> BackendResult<DeleteStatus> {
        Err(BackendError::ConnectionError(Box::new(std::io::Error::other(
            "connection reset",
        ))))
    }
}

/// Fails everything.
struct BrokenBackend;

#[async_trait]
impl Backend for BrokenBackend {
    async fn read(&self, _key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        Err(BackendError::ConnectionError(Box::new(std::io::Error::other(
            "connection refused",
        ))))
    }

    async fn execute(&self, _key: &str, _batch: Batch) -> BackendResult<()> {
        Err(BackendError::ConnectionError(Box::new(std::io::Error::other(
            "connection refused",
        ))))
    }

    async fn remove(&self, _key: &str) -> BackendResult<DeleteStatus> {
        Err(BackendError::ConnectionError(Box::new(std::io::Error::other(
            "connection refused",
        ))))
    }
}

fn response() -> CacheableResponse {
    CacheableResponse::new(StatusCode::OK)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .with_header(SET_COOKIE, HeaderValue::from_static("sid=secret"))
        .with_header(DATE, HeaderValue::from_static("Tue, 15 Nov 1994 08:12:31 GMT"))
}

async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    let entry = CacheEntry::new()
        .response(response())
        .raw(Bytes::from_static(b"{\"id\":1}"))
        .parsed(Bytes::from_static(b"parsed"));

    store.put("abc", entry).await.unwrap();
    let stored = store.get("abc").await.unwrap().unwrap();

    assert!(backend.contains_key("stowage:abc"));
    assert_eq!(stored.response.status(), StatusCode::OK);
    assert!(stored.response.is_from_cache());
    assert_eq!(stored.response.headers()[CONTENT_TYPE], "application/json");
    assert!(!stored.response.headers().contains_key(SET_COOKIE));
    assert!(!stored.response.headers().contains_key(DATE));
    assert_eq!(stored.raw, Some(Bytes::from_static(b"{\"id\":1}")));
    assert_eq!(stored.parsed, Some(Bytes::from_static(b"parsed")));
}

#[tokio::test]
async fn test_get_missing_entry() {
    let store = EntryStore::new(Arc::new(MemoryBackend::new()));

    assert!(store.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_pre_serialized_response_is_written_verbatim() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    let json = r#"{"statusCode":203,"httpVersion":"1.1","httpVersionMajor":1,"httpVersionMinor":1,"headers":{},"fromCache":true}"#;

    store
        .put("abc", CacheEntry::new().response(json.to_owned()))
        .await
        .unwrap();

    let fields = backend.read("stowage:abc").await.unwrap().unwrap();
    assert_eq!(fields["response"], Bytes::from(json));
    let stored = store.get("abc").await.unwrap().unwrap();
    assert_eq!(stored.response.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
}

#[tokio::test]
async fn test_put_with_expiry_sets_store_ttl() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    let expire_at = Utc::now() + TimeDelta::seconds(60);

    store
        .put("abc", CacheEntry::new().response(response()).expire_at(expire_at))
        .await
        .unwrap();

    assert_eq!(backend.expire_at("stowage:abc"), Some(expire_at));
    assert_eq!(backend.execute_count(), 1);
}

#[tokio::test]
async fn test_put_without_fields_or_expiry_is_noop() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));

    store.put("abc", CacheEntry::new()).await.unwrap();
    store
        .put("abc", CacheEntry::new().raw(Bytes::new()).parsed(Bytes::new()))
        .await
        .unwrap();

    assert_eq!(backend.execute_count(), 0);
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_expiry_only_put_refreshes_ttl() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    store
        .put("abc", CacheEntry::new().raw(Bytes::from_static(b"x")))
        .await
        .unwrap();
    assert_eq!(backend.expire_at("stowage:abc"), None);
    let expire_at = Utc::now() + TimeDelta::seconds(60);

    store
        .put(
            "abc",
            CacheEntry::new().raw(Bytes::new()).expire_at(expire_at),
        )
        .await
        .unwrap();

    assert_eq!(backend.expire_at("stowage:abc"), Some(expire_at));
    let fields = backend.read("stowage:abc").await.unwrap().unwrap();
    assert_eq!(fields["raw"], Bytes::from_static(b"x"));
    assert_eq!(backend.execute_count(), 2);
}

#[tokio::test]
async fn test_expiry_only_put_on_missing_key_creates_nothing() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));

    store
        .put(
            "abc",
            CacheEntry::new().expire_at(Utc::now() + TimeDelta::seconds(60)),
        )
        .await
        .unwrap();

    assert_eq!(backend.execute_count(), 1);
    assert!(!backend.contains_key("stowage:abc"));
}

#[tokio::test]
async fn test_corrupt_entry_is_reported_and_purged() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    backend
        .execute(
            "stowage:abc",
            Batch::new().hash_set(vec![("raw".to_owned(), Bytes::from_static(b"x"))]),
        )
        .await
        .unwrap();

    let error = store.get("abc").await.unwrap_err();

    assert!(matches!(error, StoreError::CorruptEntry { ref key } if key == "stowage:abc"));
    assert!(wait_until(|| !backend.contains_key("stowage:abc")).await);
    assert_eq!(backend.remove_count(), 1);
}

#[tokio::test]
async fn test_failed_cleanup_is_not_surfaced() {
    let backend = UndeletableBackend::default();
    let store = EntryStore::new(Arc::new(backend.clone()));
    backend
        .execute(
            "stowage:abc",
            Batch::new().hash_set(vec![("parsed".to_owned(), Bytes::from_static(b"x"))]),
        )
        .await
        .unwrap();

    let first = store.get("abc").await;
    let second = store.get("abc").await;

    assert!(matches!(first, Err(StoreError::CorruptEntry { .. })));
    assert!(matches!(second, Err(StoreError::CorruptEntry { .. })));
}

#[tokio::test]
async fn test_undecodable_response_is_format_error() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    backend
        .execute(
            "stowage:abc",
            Batch::new().hash_set(vec![(
                "response".to_owned(),
                Bytes::from_static(b"not json"),
            )]),
        )
        .await
        .unwrap();

    assert!(matches!(store.get("abc").await, Err(StoreError::Format(_))));
    assert!(backend.contains_key("stowage:abc"));
}

#[tokio::test]
async fn test_backend_errors_are_returned_verbatim() {
    let store = EntryStore::new(Arc::new(BrokenBackend));

    assert!(matches!(
        store.get("abc").await,
        Err(StoreError::Backend(BackendError::ConnectionError(_)))
    ));
    assert!(matches!(
        store.put("abc", CacheEntry::new().response(response())).await,
        Err(StoreError::Backend(_))
    ));
    assert!(matches!(
        store.put_with_command(Command::Delete, "abc").await,
        Err(StoreError::Backend(_))
    ));
    assert!(matches!(store.purge("abc").await, Err(StoreError::Backend(_))));
}

#[tokio::test]
async fn test_purge_reports_single_deletion() {
    let backend = MemoryBackend::new();
    let store = EntryStore::new(Arc::new(backend.clone()));
    store
        .put("abc", CacheEntry::new().response(response()))
        .await
        .unwrap();

    assert!(store.purge("abc").await.unwrap());
    assert!(!store.purge("abc").await.unwrap());
}

#[tokio::test]
async fn test_put_with_command_targets_prefixed_key() {
    let backend = MemoryBackend::new();
    let store = EntryStore::with_prefix(Arc::new(backend.clone()), "hits:");

    store.put_with_command(Command::IncrBy(3), "abc").await.unwrap();
    store.put_with_command(Command::IncrBy(4), "abc").await.unwrap();

    assert_eq!(backend.string("hits:abc"), Some(Bytes::from_static(b"7")));

    let error = store
        .put_with_command(
            Command::HashSet(vec![("f".to_owned(), Bytes::from_static(b"v"))]),
            "abc",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        StoreError::Backend(BackendError::WrongType { .. })
    ));
}
