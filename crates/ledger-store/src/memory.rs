//! In-process document store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::document::{DocFilter, Document, MAX_BATCH_OPS, OrderBy, WriteOp};
use crate::error::{Result, StoreError};
use crate::store::{Collections, DocumentStore, apply_ops, select};

/// Failure injected into a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failpoint {
    /// Batches fail when they reach the operation at this index.
    BatchAt(usize),
    /// Reads of `collection/key` fail.
    Read { collection: String, key: String },
    /// The n-th batch (0-based, counting every attempt) fails.
    NthBatch(usize),
    /// Every write fails.
    Writes,
}

/// Document store kept in memory.
///
/// Batches are staged on a copy of the data and swapped in only when every
/// operation went through.
#[derive(Debug)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    failpoints: Mutex<Vec<Failpoint>>,
    max_batch_ops: usize,
    writes: AtomicUsize,
    attempts: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(Collections::new()),
            failpoints: Mutex::new(Vec::new()),
            max_batch_ops: MAX_BATCH_OPS,
            writes: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_max_batch_ops(mut self, max: usize) -> Self {
        self.max_batch_ops = max;
        self
    }

    pub fn inject(&self, failpoint: Failpoint) {
        if let Ok(mut failpoints) = self.failpoints.lock() {
            failpoints.push(failpoint);
        }
    }

    pub fn clear_failpoints(&self) {
        if let Ok(mut failpoints) = self.failpoints.lock() {
            failpoints.clear();
        }
    }

    /// Number of successful `set` and `batch_write` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of documents currently in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.data()
            .map(|data| data.get(collection).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn data(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections.lock().map_err(|_| StoreError::Unavailable {
            reason: "memory store lock poisoned".to_string(),
        })
    }

    fn has_failpoint(&self, wanted: impl Fn(&Failpoint) -> bool) -> bool {
        self.failpoints
            .lock()
            .map(|failpoints| failpoints.iter().any(wanted))
            .unwrap_or(false)
    }

    fn batch_failure_index(&self) -> Option<usize> {
        self.failpoints.lock().ok().and_then(|failpoints| {
            failpoints.iter().find_map(|failpoint| match failpoint {
                Failpoint::BatchAt(index) => Some(*index),
                _ => None,
            })
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        if self.has_failpoint(|failpoint| {
            matches!(failpoint, Failpoint::Read { collection: c, key: k } if c == collection && k == key)
        }) {
            return Err(StoreError::Unavailable {
                reason: format!("injected read failure on {collection}/{key}"),
            });
        }
        let data = self.data()?;
        Ok(data.get(collection).and_then(|docs| docs.get(key)).cloned())
    }

    async fn set(&self, collection: &str, key: &str, value: Document) -> Result<()> {
        self.batch_write(vec![WriteOp::set(collection, key, value)])
            .await
    }

    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<()> {
        if ops.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                size: ops.len(),
                max: self.max_batch_ops,
            });
        }
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.has_failpoint(|failpoint| {
            matches!(failpoint, Failpoint::Writes)
                || matches!(failpoint, Failpoint::NthBatch(n) if *n == attempt)
        }) {
            return Err(StoreError::Unavailable {
                reason: "injected write failure".to_string(),
            });
        }

        let mut data = self.data()?;
        let mut staged = data.clone();
        let fail_at = self.batch_failure_index();
        for (index, op) in ops.into_iter().enumerate() {
            if fail_at == Some(index) {
                tracing::debug!(index, "injected batch failure, discarding staged writes");
                return Err(StoreError::Unavailable {
                    reason: format!("injected failure at batch operation {index}"),
                });
            }
            apply_ops(&mut staged, vec![op]);
        }
        *data = staged;
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: &DocFilter,
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<(String, Document)>> {
        let data = self.data()?;
        Ok(select(&data, collection, filter, order_by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get() {
        let store = MemoryStore::new();
        store.set("tables", "t1", json!({"rows": []})).await.unwrap();
        assert_eq!(
            store.get("tables", "t1").await.unwrap(),
            Some(json!({"rows": []}))
        );
        assert_eq!(store.get("tables", "t2").await.unwrap(), None);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn failed_batch_leaves_nothing_behind() {
        let store = MemoryStore::new();
        store.set("tables", "t1", json!({"v": 1})).await.unwrap();
        store.inject(Failpoint::BatchAt(2));

        let result = store
            .batch_write(vec![
                WriteOp::set("tables", "t1", json!({"v": 2})),
                WriteOp::set("audit", "a1", json!({"x": 1})),
                WriteOp::set("audit", "a2", json!({"x": 2})),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(store.get("tables", "t1").await.unwrap(), Some(json!({"v": 1})));
        assert_eq!(store.len("audit"), 0);
    }

    #[tokio::test]
    async fn oversized_batch_is_refused() {
        let store = MemoryStore::new().with_max_batch_ops(2);
        let ops = (0..3)
            .map(|i| WriteOp::set("audit", format!("a{i}"), json!(i)))
            .collect();
        assert!(matches!(
            store.batch_write(ops).await,
            Err(StoreError::BatchTooLarge { size: 3, max: 2 })
        ));
    }

    #[tokio::test]
    async fn injected_read_failure() {
        let store = MemoryStore::new();
        store.inject(Failpoint::Read {
            collection: "tables".to_string(),
            key: "t1".to_string(),
        });
        assert!(store.get("tables", "t1").await.is_err());
        store.clear_failpoints();
        assert!(store.get("tables", "t1").await.unwrap().is_none());
    }
}
