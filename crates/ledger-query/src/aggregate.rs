//! Consolidation of many tables into one view keyed by thematic label.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::future::join_all;
use ledger_core::TABLES;
use ledger_model::{AggregatedRow, Row, TableDocument, TableKey};
use ledger_store::DocumentStore;

use crate::error::{QueryError, Result};

/// A table that can be read for aggregation.
#[async_trait]
pub trait RowSource: Send + Sync {
    fn key(&self) -> &TableKey;

    /// All rows of the table, slots already decoded to numbers.
    async fn fetch(&self) -> Result<Vec<Row>>;
}

/// A table read from a [`DocumentStore`].
///
/// An absent table contributes no rows.
pub struct StoredTable<'a> {
    store: &'a dyn DocumentStore,
    key: TableKey,
}

impl<'a> StoredTable<'a> {
    pub fn new(store: &'a dyn DocumentStore, key: TableKey) -> Self {
        Self { store, key }
    }
}

#[async_trait]
impl RowSource for StoredTable<'_> {
    fn key(&self) -> &TableKey {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<Row>> {
        let document = self
            .store
            .get(TABLES, self.key.as_str())
            .await
            .map_err(|source| QueryError::Fetch {
                table: self.key.clone(),
                source,
            })?;
        let Some(document) = document else {
            tracing::debug!(table = %self.key, "table absent, nothing to aggregate");
            return Ok(Vec::new());
        };
        let table: TableDocument =
            serde_json::from_value(document).map_err(|source| QueryError::Corrupt {
                table: self.key.clone(),
                source,
            })?;
        Ok(table.rows)
    }
}

/// A source left out of an aggregation.
#[derive(Debug)]
pub struct SourceFailure {
    pub table: TableKey,
    pub error: QueryError,
}

/// Consolidated rows plus the sources that could not be read.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub rows: Vec<AggregatedRow>,
    pub failures: Vec<SourceFailure>,
}

impl Aggregation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches every source concurrently and merges the rows that came back.
///
/// Results are folded in source order whatever the completion order, so the
/// output is deterministic. A failing source is skipped and reported.
pub async fn aggregate(sources: &[&dyn RowSource]) -> Aggregation {
    let fetched = join_all(sources.iter().map(|source| source.fetch())).await;

    let mut tables = Vec::with_capacity(sources.len());
    let mut failures = Vec::new();
    for (source, result) in sources.iter().zip(fetched) {
        match result {
            Ok(rows) => tables.push((source.key().clone(), rows)),
            Err(error) => {
                tracing::warn!(table = %source.key(), %error, "source skipped");
                failures.push(SourceFailure {
                    table: source.key().clone(),
                    error,
                });
            }
        }
    }

    let rows = merge(tables);
    tracing::info!(
        sources = sources.len(),
        failed = failures.len(),
        rows = rows.len(),
        "aggregated tables"
    );
    Aggregation { rows, failures }
}

/// Folds tables in order, then rows in order, into one row per `thematique`.
///
/// The first row seen for a key is copied whole; later rows only add their
/// contribution slots. Vectors of different lengths are summed over the
/// longest one, missing slots counting as zero.
pub fn merge<I>(tables: I) -> Vec<AggregatedRow>
where
    I: IntoIterator<Item = (TableKey, Vec<Row>)>,
{
    let mut merged: Vec<AggregatedRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (table, rows) in tables {
        for row in rows {
            match index.get(&row.thematique) {
                Some(&position) => {
                    let entry = &mut merged[position];
                    add_slots(&mut entry.row.contributions, &row.contributions);
                    if !entry.sources.contains(&table) {
                        entry.sources.push(table.clone());
                    }
                }
                None => {
                    index.insert(row.thematique.clone(), merged.len());
                    merged.push(AggregatedRow {
                        row,
                        sources: vec![table.clone()],
                    });
                }
            }
        }
    }
    merged
}

fn add_slots(total: &mut Vec<u64>, more: &[u64]) {
    if more.len() > total.len() {
        total.resize(more.len(), 0);
    }
    for (slot, value) in total.iter_mut().zip(more) {
        *slot = slot.saturating_add(*value);
    }
}
