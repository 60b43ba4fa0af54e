//! Chunked bulk deletion.
//!
//! A bulk delete larger than one atomic batch is split into sequential
//! chunks. Each chunk is atomic on its own; the operation as a whole is
//! **not**: when a chunk fails, the chunks before it stay applied.

use crate::document::{MAX_BATCH_OPS, WriteOp};
use crate::error::{Result, StoreError};
use crate::store::DocumentStore;

/// How large each atomic chunk may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    pub max_batch_ops: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_batch_ops: MAX_BATCH_OPS,
        }
    }
}

impl ChunkPolicy {
    pub fn new(max_batch_ops: usize) -> Self {
        Self {
            max_batch_ops: max_batch_ops.max(1),
        }
    }
}

/// Outcome of a completed bulk delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PurgeReport {
    pub deleted: usize,
    pub batches: usize,
}

/// Deletes `keys` from `collection` in sequential chunks.
///
/// On failure the error carries how many documents and batches were already
/// committed.
pub async fn delete_in_chunks<S>(
    store: &S,
    collection: &str,
    keys: &[String],
    policy: ChunkPolicy,
) -> Result<PurgeReport>
where
    S: DocumentStore + ?Sized,
{
    let mut report = PurgeReport::default();
    for chunk in keys.chunks(policy.max_batch_ops.max(1)) {
        let ops = chunk
            .iter()
            .map(|key| WriteOp::delete(collection, key.as_str()))
            .collect();
        if let Err(source) = store.batch_write(ops).await {
            tracing::warn!(
                collection,
                deleted = report.deleted,
                batches = report.batches,
                "bulk delete stopped on a failing chunk"
            );
            return Err(StoreError::ChunkFailed {
                deleted: report.deleted,
                batches: report.batches,
                source: Box::new(source),
            });
        }
        report.deleted += chunk.len();
        report.batches += 1;
        tracing::debug!(collection, chunk = chunk.len(), "deleted chunk");
    }
    Ok(report)
}
