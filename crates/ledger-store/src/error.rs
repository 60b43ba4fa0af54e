//! Store error types.
//!
//! Every store operation returns a structured error that can be shown to the
//! user as a transient message; none of them is fatal.

use std::path::PathBuf;
use thiserror::Error;

/// Document store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O error.
    #[error("Failed to {operation} store file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document could not be encoded.
    #[error("Failed to serialize document {collection}/{key}")]
    Serialization {
        collection: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored data could not be decoded.
    #[error("Failed to deserialize {what}")]
    Deserialization {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// A batch exceeded the store's atomic write limit.
    #[error("Batch of {size} operations exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// The backend refused the operation.
    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    /// The temp file could not be moved over the store file.
    #[error("Failed to complete write")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chunked bulk delete stopped part way; earlier chunks stay applied.
    #[error("Bulk delete stopped after {deleted} documents in {batches} batches")]
    ChunkFailed {
        deleted: usize,
        batches: usize,
        #[source]
        source: Box<StoreError>,
    },

    /// A blocking store task could not be joined.
    #[error("Store task failed")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl StoreError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => format!("Could not {} the data file at {}", operation, path.display()),
            Self::Serialization { collection, key, .. } => {
                format!("The document {collection}/{key} could not be saved.")
            }
            Self::Deserialization { what, .. } => {
                format!("The stored {what} is unreadable. The data file may be corrupted.")
            }
            Self::BatchTooLarge { size, max } => format!(
                "Too many changes to save at once ({size}, at most {max}). Save more often."
            ),
            Self::Unavailable { reason } => format!("The data store is unavailable: {reason}"),
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save to {}. Please check disk space and permissions.",
                target_path.display()
            ),
            Self::ChunkFailed {
                deleted, source, ..
            } => format!(
                "Deletion stopped after {} documents: {}",
                deleted,
                source.user_message()
            ),
            Self::Task { .. } => "The data store did not answer.".to_string(),
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
