//! Query and export error types.

use ledger_model::TableKey;
use ledger_store::StoreError;
use thiserror::Error;

/// Error raised while fetching a source or exporting rows.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A source table could not be read.
    #[error("Failed to fetch table {table}")]
    Fetch {
        table: TableKey,
        #[source]
        source: StoreError,
    },

    /// A source table document could not be decoded.
    #[error("Table {table} is corrupted")]
    Corrupt {
        table: TableKey,
        #[source]
        source: serde_json::Error,
    },

    /// CSV encoding error.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// Flushing the export destination failed.
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

impl QueryError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch { table, source } => {
                format!("{table} was skipped: {}", source.user_message())
            }
            Self::Corrupt { table, .. } => format!("{table} was skipped: its data is unreadable."),
            Self::Csv(e) => format!("Could not write the CSV export: {e}"),
            Self::Io(e) => format!("Could not write the export file: {e}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;
