//! Audit entries: building them at commit time and reading them back.

use chrono::{DateTime, Utc};
use ledger_model::{AuditEntry, ChangeRecord, TableKey, UserId};
use ledger_store::{DocFilter, DocumentStore, OrderBy, StoreError};

use crate::error::Result;
use crate::persist::AUDIT;

/// Attributes each change to `user` at `timestamp`, preserving order.
///
/// An empty input yields no entries; callers treat that as a no-op save.
pub fn to_audit_entries(
    changes: &[ChangeRecord],
    user: &UserId,
    timestamp: DateTime<Utc>,
    table_key: &TableKey,
) -> Vec<AuditEntry> {
    changes
        .iter()
        .map(|change| AuditEntry {
            change: change.clone(),
            user: user.clone(),
            timestamp,
            table_key: table_key.clone(),
        })
        .collect()
}

/// Audit trail of one table, newest first.
pub async fn audit_log<S>(store: &S, table_key: &TableKey) -> Result<Vec<AuditEntry>>
where
    S: DocumentStore + ?Sized,
{
    let documents = store
        .query(
            AUDIT,
            &DocFilter::eq("tableKey", table_key.as_str()),
            Some(&OrderBy::desc("timestamp")),
        )
        .await?;

    let entries = documents
        .into_iter()
        .map(|(key, document)| {
            serde_json::from_value(document).map_err(|source| StoreError::Deserialization {
                what: format!("audit entry {key}"),
                source,
            })
        })
        .collect::<std::result::Result<Vec<AuditEntry>, _>>()?;
    tracing::debug!(table = %table_key, entries = entries.len(), "read audit log");
    Ok(entries)
}
