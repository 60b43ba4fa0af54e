//! The document store contract.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::document::{DocFilter, Document, OrderBy, WriteKind, WriteOp};
use crate::error::Result;

/// Read/write/query contract of the backing document store.
///
/// Implementations must apply [`DocumentStore::batch_write`] all-or-nothing:
/// when it returns an error, no operation of the batch may be visible to
/// later reads.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `None` when absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Full-document overwrite with upsert semantics.
    async fn set(&self, collection: &str, key: &str, value: Document) -> Result<()>;

    /// Apply every operation or none of them.
    async fn batch_write(&self, ops: Vec<WriteOp>) -> Result<()>;

    /// Documents of `collection` matching `filter`, as `(key, document)`
    /// pairs, ordered by key unless `order_by` is given.
    async fn query(
        &self,
        collection: &str,
        filter: &DocFilter,
        order_by: Option<&OrderBy>,
    ) -> Result<Vec<(String, Document)>>;
}

/// In-memory layout shared by the bundled stores: collection -> key -> document.
pub(crate) type Collections = BTreeMap<String, BTreeMap<String, Document>>;

/// Applies `ops` in order to `collections`.
pub(crate) fn apply_ops(collections: &mut Collections, ops: Vec<WriteOp>) {
    for op in ops {
        match op.kind {
            WriteKind::Set(value) => {
                collections
                    .entry(op.collection)
                    .or_default()
                    .insert(op.key, value);
            }
            WriteKind::Delete => {
                if let Some(docs) = collections.get_mut(&op.collection) {
                    docs.remove(&op.key);
                }
            }
        }
    }
}

/// Runs a query against an in-memory snapshot of the collections.
pub(crate) fn select(
    collections: &Collections,
    collection: &str,
    filter: &DocFilter,
    order_by: Option<&OrderBy>,
) -> Vec<(String, Document)> {
    let mut docs: Vec<(String, Document)> = collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .filter(|(_, doc)| filter.matches(doc))
                .map(|(key, doc)| (key.clone(), doc.clone()))
                .collect()
        })
        .unwrap_or_default();
    if let Some(order) = order_by {
        order.sort(&mut docs);
    }
    docs
}
