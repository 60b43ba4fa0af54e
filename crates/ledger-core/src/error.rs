//! Engine error types.

use ledger_model::{ModelError, RowId, TableKey};
use ledger_store::StoreError;
use thiserror::Error;

/// Error raised by a table session or one of its engine steps.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input refused at the edit boundary; the working copy is unchanged.
    #[error("edit rejected: {0}")]
    Rejected(#[from] ModelError),

    /// The edited row does not exist in the working copy.
    #[error("row {0} not found")]
    UnknownRow(RowId),

    /// Reading the table failed for another reason than absence.
    #[error("failed to load table {table}")]
    Load {
        table: TableKey,
        #[source]
        source: StoreError,
    },

    /// The stored table document could not be decoded.
    #[error("table {table} is corrupted")]
    Corrupt {
        table: TableKey,
        #[source]
        source: serde_json::Error,
    },

    /// The commit batch was refused; nothing was written.
    #[error("failed to save table {table}")]
    Commit {
        table: TableKey,
        #[source]
        source: StoreError,
    },

    /// Any other store failure (audit reads, administrative purges).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(reason) => format!("Value refused: {reason}"),
            Self::UnknownRow(id) => format!("Row {id} does not exist in this table."),
            Self::Load { table, source } => {
                format!("Could not open {table}: {}", source.user_message())
            }
            Self::Corrupt { table, .. } => {
                format!("The stored data of {table} is unreadable.")
            }
            Self::Commit { table, source } => format!(
                "Changes to {table} were not saved: {} Your edits are kept; try again.",
                source.user_message()
            ),
            Self::Store(source) => source.user_message(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
