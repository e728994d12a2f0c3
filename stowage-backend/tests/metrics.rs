//! Entry store metrics, recorded through a local debugging recorder.

#![cfg(feature = "metrics")]

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use metrics_util::{CompositeKey, MetricKind};
use stowage_backend::{Backend, Batch, CacheEntry, EntryStore, MemoryBackend};
use stowage_core::CacheableResponse;

type SnapshotEntry = (
    CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
);

fn find_counter(entries: &[SnapshotEntry], name: &str, labels: &[(&str, &str)]) -> Option<u64> {
    entries.iter().find_map(|(key, _, _, value)| {
        let matches = key.kind() == MetricKind::Counter
            && key.key().name() == name
            && labels.iter().all(|(label, expected)| {
                key.key()
                    .labels()
                    .any(|l| l.key() == *label && l.value() == *expected)
            });
        match value {
            DebugValue::Counter(count) if matches => Some(*count),
            _ => None,
        }
    })
}

fn run<F: Future<Output = ()>>(recorder: &DebuggingRecorder, future: F) {
    metrics::with_local_recorder(recorder, || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(future);
    });
}

#[test]
fn test_read_outcomes_are_counted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    run(&recorder, async {
        let backend = MemoryBackend::new();
        let store = EntryStore::new(Arc::new(backend.clone()));
        store
            .put(
                "hit",
                CacheEntry::new().response(CacheableResponse::new(StatusCode::OK)),
            )
            .await
            .unwrap();
        backend
            .execute(
                "stowage:corrupt",
                Batch::new().hash_set(vec![("raw".to_owned(), Bytes::from_static(b"x"))]),
            )
            .await
            .unwrap();

        store.get("hit").await.unwrap();
        store.get("miss").await.unwrap();
        store.get("corrupt").await.unwrap_err();
        store.purge("hit").await.unwrap();
    });

    let entries = snapshotter.snapshot().into_vec();
    for outcome in ["hit", "miss", "corrupt"] {
        assert_eq!(
            find_counter(
                &entries,
                "stowage_entry_read_total",
                &[("backend", "memory"), ("outcome", outcome)]
            ),
            Some(1),
            "{outcome}"
        );
    }
    assert_eq!(
        find_counter(&entries, "stowage_entry_write_total", &[("backend", "memory")]),
        Some(1)
    );
    assert_eq!(
        find_counter(
            &entries,
            "stowage_entry_purge_total",
            &[("backend", "memory"), ("deleted", "true")]
        ),
        Some(1)
    );
}
