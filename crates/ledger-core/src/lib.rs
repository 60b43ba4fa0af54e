//! Optimistic edit engine for contribution ledger tables.
//!
//! A [`TableSession`] holds one user's working copy of a table next to the
//! last committed [`Snapshot`]. Saving runs the pipeline
//! [`diff`] -> [`to_audit_entries`] -> [`commit`]: the table overwrite and
//! every audit entry land in one atomic batch, after which the snapshot is
//! replaced by a deep copy of what was written.
//!
//! Bulk administration ([`purge_audit`], [`delete_table`]) lives next to the
//! engine but is chunked rather than atomic.

pub mod admin;
pub mod audit;
pub mod diff;
pub mod dirty;
pub mod error;
pub mod persist;
pub mod session;
pub mod snapshot;

pub use admin::{delete_table, purge_audit};
pub use audit::{audit_log, to_audit_entries};
pub use diff::diff;
pub use dirty::{ConfirmGate, DirtyTracker, LeaveDecision, NavigationIntent};
pub use error::{LedgerError, Result};
pub use persist::{AUDIT, TABLES, commit};
pub use session::{SaveOutcome, TableSession};
pub use snapshot::{LoadOrigin, LoadedTable, Snapshot, load_table, read_table};
