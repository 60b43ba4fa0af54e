//! Data model for contribution ledger tables.
//!
//! A table is a list of [`Row`]s, each carrying descriptive text fields and a
//! contribution vector with one slot per team of the [`TeamRoster`]. Edits are
//! described as [`ChangeRecord`]s and persisted as [`AuditEntry`]s.

pub mod change;
pub mod consolidated;
pub mod error;
pub mod ids;
pub mod roster;
pub mod row;
pub mod table;

pub use change::{AuditEntry, ChangeField, ChangeRecord, FieldValue};
pub use consolidated::AggregatedRow;
pub use error::{ModelError, Result};
pub use ids::{RowId, TableKey, UserId};
pub use roster::TeamRoster;
pub use row::{Row, TextField, coerce_slot, parse_contribution};
pub use table::TableDocument;
