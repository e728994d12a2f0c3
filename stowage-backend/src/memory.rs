//! In-process backend on top of [`DashMap`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::backend::{Backend, BackendResult};
use crate::{BackendError, Batch, Command, DeleteStatus};

/// Operation counters of a [`MemoryBackend`].
#[derive(Debug, Default)]
pub struct BackendCounters {
    pub read_count: AtomicUsize,
    pub read_hit_count: AtomicUsize,
    pub read_miss_count: AtomicUsize,
    pub execute_count: AtomicUsize,
    pub remove_count: AtomicUsize,
}

impl BackendCounters {
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }

    pub fn read_hit_count(&self) -> usize {
        self.read_hit_count.load(Ordering::SeqCst)
    }

    pub fn read_miss_count(&self) -> usize {
        self.read_miss_count.load(Ordering::SeqCst)
    }

    pub fn execute_count(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_count.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.read_count.store(0, Ordering::SeqCst);
        self.read_hit_count.store(0, Ordering::SeqCst);
        self.read_miss_count.store(0, Ordering::SeqCst);
        self.execute_count.store(0, Ordering::SeqCst);
        self.remove_count.store(0, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Hash(HashMap<String, Bytes>),
    String(Bytes),
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    expire_at: Option<DateTime<Utc>>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self {
            value,
            expire_at: None,
        }
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

/// Key-value store living in process memory.
///
/// Mirrors the data model of a Redis-like store: a key holds either a hash
/// or a string, and may carry an absolute expiry. Expired keys are dropped
/// lazily on access. Cloning shares the underlying map and counters.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: Arc<DashMap<String, Slot>>,
    counters: Arc<BackendCounters>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> &BackendCounters {
        &self.counters
    }

    pub fn read_count(&self) -> usize {
        self.counters.read_count()
    }

    pub fn execute_count(&self) -> usize {
        self.counters.execute_count()
    }

    pub fn remove_count(&self) -> usize {
        self.counters.remove_count()
    }

    pub fn reset_counters(&self) {
        self.counters.reset();
    }

    /// Number of keys, expired ones included until they are touched.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|slot| !slot.is_expired(Utc::now()))
    }

    /// Expiry currently set on `key`.
    pub fn expire_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.get(key).and_then(|slot| slot.expire_at)
    }

    /// String value stored at `key`, if it holds one.
    pub fn string(&self, key: &str) -> Option<Bytes> {
        self.entries.get(key).and_then(|slot| match &slot.value {
            Value::String(value) if !slot.is_expired(Utc::now()) => Some(value.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn read(&self, key: &str) -> BackendResult<Option<HashMap<String, Bytes>>> {
        self.counters.read_count.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let result = match self.entries.entry(key.to_owned()) {
            Entry::Occupied(entry) if entry.get().is_expired(now) => {
                trace!(key, "Dropping expired key");
                entry.remove();
                None
            }
            Entry::Occupied(entry) => match &entry.get().value {
                Value::Hash(fields) if !fields.is_empty() => Some(fields.clone()),
                Value::Hash(_) => None,
                Value::String(_) => {
                    return Err(BackendError::WrongType {
                        key: key.to_owned(),
                    });
                }
            },
            Entry::Vacant(_) => None,
        };
        if result.is_some() {
            self.counters.read_hit_count.fetch_add(1, Ordering::SeqCst);
        } else {
            self.counters.read_miss_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(result)
    }

    async fn execute(&self, key: &str, batch: Batch) -> BackendResult<()> {
        self.counters.execute_count.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        // The entry guard holds the shard lock, so the batch applies atomically.
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => {
                let current = (!entry.get().is_expired(now)).then(|| entry.get().clone());
                match apply(key, current, batch, now)? {
                    Some(slot) => {
                        entry.insert(slot);
                    }
                    None => {
                        entry.remove();
                    }
                }
            }
            Entry::Vacant(entry) => {
                if let Some(slot) = apply(key, None, batch, now)? {
                    entry.insert(slot);
                }
            }
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> BackendResult<DeleteStatus> {
        self.counters.remove_count.fetch_add(1, Ordering::SeqCst);
        match self.entries.remove(key) {
            Some((_, slot)) if !slot.is_expired(Utc::now()) => Ok(DeleteStatus::Deleted(1)),
            _ => Ok(DeleteStatus::Missing),
        }
    }

    fn label(&self) -> &str {
        "memory"
    }
}

/// Applies `batch` to a copy of the slot. Nothing is written on error.
fn apply(
    key: &str,
    mut slot: Option<Slot>,
    batch: Batch,
    now: DateTime<Utc>,
) -> BackendResult<Option<Slot>> {
    let wrong_type = || BackendError::WrongType {
        key: key.to_owned(),
    };
    for command in batch {
        slot = match (command, slot) {
            (Command::HashSet(fields), None) if fields.is_empty() => None,
            (Command::HashSet(fields), None) => {
                Some(Slot::new(Value::Hash(fields.into_iter().collect())))
            }
            (Command::HashSet(fields), Some(mut current)) => match &mut current.value {
                Value::Hash(existing) => {
                    existing.extend(fields);
                    Some(current)
                }
                Value::String(_) => return Err(wrong_type()),
            },
            (Command::Set(value), _) => Some(Slot::new(Value::String(value))),
            (Command::Append(value), None) => Some(Slot::new(Value::String(value))),
            (Command::Append(value), Some(mut current)) => match &current.value {
                Value::String(existing) => {
                    let mut joined = BytesMut::with_capacity(existing.len() + value.len());
                    joined.extend_from_slice(existing);
                    joined.extend_from_slice(&value);
                    current.value = Value::String(joined.freeze());
                    Some(current)
                }
                Value::Hash(_) => return Err(wrong_type()),
            },
            (Command::IncrBy(delta), current) => {
                let (base, expire_at) = match &current {
                    None => (0, None),
                    Some(Slot {
                        value: Value::String(existing),
                        expire_at,
                    }) => (parse_integer(existing)?, *expire_at),
                    Some(_) => return Err(wrong_type()),
                };
                let value = base.checked_add(delta).ok_or_else(|| {
                    BackendError::InternalError(Box::new(std::io::Error::other(
                        "increment or decrement would overflow",
                    )))
                })?;
                Some(Slot {
                    value: Value::String(Bytes::from(value.to_string())),
                    expire_at,
                })
            }
            (Command::ExpireAt(at), current) => expire(current, at, now),
            (Command::Expire(ttl), current) => {
                let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
                let at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
                expire(current, at, now)
            }
            (Command::Delete, _) => None,
        };
    }
    Ok(slot)
}

fn expire(slot: Option<Slot>, at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Slot> {
    let mut slot = slot?;
    if at <= now {
        return None;
    }
    slot.expire_at = Some(at);
    Some(slot)
}

fn parse_integer(value: &Bytes) -> BackendResult<i64> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| {
            BackendError::InternalError(Box::new(std::io::Error::other(
                "value is not an integer",
            )))
        })
}
