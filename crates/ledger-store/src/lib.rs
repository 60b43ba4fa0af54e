//! Document store contract for contribution ledger tables.
//!
//! The ledger engine only relies on four operations of its backing store:
//! point reads, full-document upserts, all-or-nothing batches and filtered
//! queries. This crate defines that contract ([`DocumentStore`]) and ships
//! two implementations:
//!
//! - [`MemoryStore`] - in-process, with failure injection for tests
//! - [`FileStore`] - one JSON file, replaced atomically on every write
//!
//! Batches are bounded by [`MAX_BATCH_OPS`]; bulk deletions larger than that
//! go through [`delete_in_chunks`], which is atomic per chunk only.

mod chunk;
mod document;
mod error;
mod file;
mod memory;
mod store;

pub use chunk::{ChunkPolicy, PurgeReport, delete_in_chunks};
pub use document::{DocFilter, Direction, Document, MAX_BATCH_OPS, OrderBy, WriteKind, WriteOp};
pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::{Failpoint, MemoryStore};
pub use store::DocumentStore;
