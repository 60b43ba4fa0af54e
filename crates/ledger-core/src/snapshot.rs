//! Baseline management: loading a table and capturing committed states.

use std::sync::Arc;

use ledger_model::{Row, TableDocument, TableKey, TeamRoster};
use ledger_store::DocumentStore;

use crate::error::{LedgerError, Result};
use crate::persist::TABLES;

/// Last persisted state of a table, used as the diff reference.
///
/// The rows are captured by deep copy and shared read-only; a snapshot is
/// replaced, never edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    rows: Arc<[Row]>,
}

impl Snapshot {
    /// Deep-copies `rows` into a new baseline.
    pub fn capture(rows: &[Row]) -> Self {
        Self {
            rows: rows.to_vec().into(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// A fresh, independently owned copy of the baseline rows.
    pub fn to_working_copy(&self) -> Vec<Row> {
        self.rows.to_vec()
    }
}

/// Where the rows of a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Stored,
    /// The table was absent; the caller's initial rows were used and written
    /// back when `written_back` is true.
    Fallback { written_back: bool },
}

/// A table as handed to a session.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub working: Vec<Row>,
    pub snapshot: Snapshot,
    pub origin: LoadOrigin,
}

/// Loads `key`, falling back to `initial` when the table is absent.
///
/// Contribution vectors are fitted to the roster size. The fallback write-back
/// is best effort: a failure is logged and the table still loads.
pub async fn load_table<S, F>(
    store: &S,
    key: &TableKey,
    roster: &TeamRoster,
    initial: F,
) -> Result<LoadedTable>
where
    S: DocumentStore + ?Sized,
    F: FnOnce() -> Vec<Row>,
{
    let (mut rows, origin) = match fetch_rows(store, key).await? {
        Some(rows) => (rows, LoadOrigin::Stored),
        None => {
            let mut rows = initial();
            fit_rows(&mut rows, roster);
            let written_back = write_back(store, key, &rows).await;
            (rows, LoadOrigin::Fallback { written_back })
        }
    };
    fit_rows(&mut rows, roster);
    Ok(loaded(key, rows, origin))
}

/// Loads `key` without writing anything; `None` when the table is absent.
pub async fn read_table<S>(
    store: &S,
    key: &TableKey,
    roster: &TeamRoster,
) -> Result<Option<LoadedTable>>
where
    S: DocumentStore + ?Sized,
{
    let Some(mut rows) = fetch_rows(store, key).await? else {
        tracing::debug!(table = %key, "table absent");
        return Ok(None);
    };
    fit_rows(&mut rows, roster);
    Ok(Some(loaded(key, rows, LoadOrigin::Stored)))
}

async fn fetch_rows<S>(store: &S, key: &TableKey) -> Result<Option<Vec<Row>>>
where
    S: DocumentStore + ?Sized,
{
    let stored = store
        .get(TABLES, key.as_str())
        .await
        .map_err(|source| LedgerError::Load {
            table: key.clone(),
            source,
        })?;
    let Some(document) = stored else {
        return Ok(None);
    };
    let document: TableDocument =
        serde_json::from_value(document).map_err(|source| LedgerError::Corrupt {
            table: key.clone(),
            source,
        })?;
    Ok(Some(document.rows))
}

fn loaded(key: &TableKey, rows: Vec<Row>, origin: LoadOrigin) -> LoadedTable {
    tracing::info!(table = %key, rows = rows.len(), ?origin, "loaded table");
    let snapshot = Snapshot::capture(&rows);
    LoadedTable {
        working: rows,
        snapshot,
        origin,
    }
}

fn fit_rows(rows: &mut [Row], roster: &TeamRoster) {
    for row in rows {
        row.fit_to_roster(roster.len());
    }
}

async fn write_back<S>(store: &S, key: &TableKey, rows: &[Row]) -> bool
where
    S: DocumentStore + ?Sized,
{
    let document = match serde_json::to_value(TableDocument::new(rows.to_vec())) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!(table = %key, %error, "initial table could not be encoded");
            return false;
        }
    };
    match store.set(TABLES, key.as_str(), document).await {
        Ok(()) => true,
        Err(error) => {
            tracing::warn!(table = %key, %error, "initial write-back failed");
            false
        }
    }
}
