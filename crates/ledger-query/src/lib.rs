//! Consolidated view over many contribution ledger tables.
//!
//! [`aggregate`] fetches every table concurrently and merges rows sharing a
//! `thematique` into one [`AggregatedRow`](ledger_model::AggregatedRow) whose
//! contributions are the elementwise sum. The result, or any other row set,
//! is then narrowed with [`query`] (conjunctive filters, one stable sort key,
//! fixed-size pages) and exported with [`export_csv`].
//!
//! Aggregation is read-only: it never touches baselines or audit entries.

pub mod aggregate;
pub mod error;
pub mod export;
pub mod query;

pub use aggregate::{Aggregation, RowSource, SourceFailure, StoredTable, aggregate, merge};
pub use error::{QueryError, Result};
pub use export::{CsvExportOptions, NARROW_NBSP, export_csv, export_header, group_thousands};
pub use query::{
    Choice, Filter, Page, QueryState, Sort, SortDirection, SortKey, query, toggle_sort,
};
