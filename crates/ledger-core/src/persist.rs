//! Atomic commit of a working copy together with its audit entries.

use chrono::{DateTime, Utc};
use ledger_model::{AuditEntry, Row, TableDocument, TableKey, UserId};
use ledger_store::{DocumentStore, StoreError, WriteOp};
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Collection holding one document per table.
pub const TABLES: &str = "tables";
/// Collection holding one document per audit entry.
pub const AUDIT: &str = "audit";

/// Writes the whole working copy and every audit entry in one batch.
///
/// The table document is a full overwrite (last writer wins). On success the
/// returned snapshot is a deep copy of `working`; on failure nothing was
/// applied and the caller keeps its state.
pub async fn commit<S>(
    store: &S,
    table_key: &TableKey,
    working: &[Row],
    entries: &[AuditEntry],
    user: &UserId,
    at: DateTime<Utc>,
) -> Result<Snapshot, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let ops = commit_batch(table_key, working, entries, user, at)?;
    let operations = ops.len();
    store.batch_write(ops).await?;

    tracing::info!(
        table = %table_key,
        user = %user,
        rows = working.len(),
        audit_entries = entries.len(),
        operations,
        "committed table"
    );
    Ok(Snapshot::capture(working))
}

/// Prepares the batch: table overwrite first, then one insert per entry.
fn commit_batch(
    table_key: &TableKey,
    working: &[Row],
    entries: &[AuditEntry],
    user: &UserId,
    at: DateTime<Utc>,
) -> Result<Vec<WriteOp>, StoreError> {
    let document = TableDocument::new(working.to_vec()).stamped(user, at);
    let table = serde_json::to_value(&document).map_err(|source| StoreError::Serialization {
        collection: TABLES.to_string(),
        key: table_key.to_string(),
        source,
    })?;

    let mut ops = Vec::with_capacity(entries.len() + 1);
    ops.push(WriteOp::set(TABLES, table_key.as_str(), table));
    for entry in entries {
        let key = Uuid::new_v4().simple().to_string();
        let value = serde_json::to_value(entry).map_err(|source| StoreError::Serialization {
            collection: AUDIT.to_string(),
            key: key.clone(),
            source,
        })?;
        ops.push(WriteOp::set(AUDIT, key, value));
    }
    Ok(ops)
}
