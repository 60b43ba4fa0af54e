//! Administrative bulk operations.
//!
//! These run outside any edit session and may touch more documents than one
//! atomic batch allows, so they are chunked and only atomic per chunk.

use ledger_model::TableKey;
use ledger_store::{ChunkPolicy, DocFilter, DocumentStore, PurgeReport, StoreError, WriteOp};

use crate::error::Result;
use crate::persist::{AUDIT, TABLES};

/// Deletes every audit entry of `table_key`.
///
/// When a chunk fails the error reports how many entries were already gone;
/// rerunning the purge picks up the rest.
pub async fn purge_audit<S>(store: &S, table_key: &TableKey, policy: ChunkPolicy) -> Result<PurgeReport>
where
    S: DocumentStore + ?Sized,
{
    let keys: Vec<String> = store
        .query(AUDIT, &DocFilter::eq("tableKey", table_key.as_str()), None)
        .await?
        .into_iter()
        .map(|(key, _)| key)
        .collect();

    let report = ledger_store::delete_in_chunks(store, AUDIT, &keys, policy).await?;
    tracing::info!(
        table = %table_key,
        deleted = report.deleted,
        batches = report.batches,
        "purged audit log"
    );
    Ok(report)
}

/// Purges the audit log of `table_key`, then deletes the table itself.
///
/// The table document is only removed once its whole audit log is gone.
pub async fn delete_table<S>(store: &S, table_key: &TableKey, policy: ChunkPolicy) -> Result<PurgeReport>
where
    S: DocumentStore + ?Sized,
{
    let mut report = purge_audit(store, table_key, policy).await?;
    store
        .batch_write(vec![WriteOp::delete(TABLES, table_key.as_str())])
        .await
        .map_err(|source| StoreError::ChunkFailed {
            deleted: report.deleted,
            batches: report.batches,
            source: Box::new(source),
        })?;
    report.deleted += 1;
    report.batches += 1;
    tracing::info!(table = %table_key, "deleted table");
    Ok(report)
}
