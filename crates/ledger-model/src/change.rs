//! Field-level change records and the audit entries built from them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{RowId, TableKey, UserId};
use crate::row::TextField;

/// Which part of a row changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ChangeField {
    Text(TextField),
    /// One contribution slot, labelled with the owning team.
    Contribution { slot: usize, team: String },
    /// The whole comment map.
    Comments,
}

impl fmt::Display for ChangeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(field) => write!(f, "{field}"),
            Self::Contribution { team, .. } => write!(f, "contribution {team}"),
            Self::Comments => f.write_str("comments"),
        }
    }
}

/// Before/after value carried by a change record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Count(u64),
    Text(String),
    Comments(BTreeMap<UserId, String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Comments(comments) => {
                for (index, (user, text)) in comments.iter().enumerate() {
                    if index > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{user}: {text}")?;
                }
                Ok(())
            }
        }
    }
}

/// One field that differs between the baseline and the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub row_id: RowId,
    pub row_label: String,
    pub field: ChangeField,
    pub old_value: FieldValue,
    pub new_value: FieldValue,
}

/// Immutable, attributed record of one committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(flatten)]
    pub change: ChangeRecord,
    pub user: UserId,
    /// Stored as epoch milliseconds so the store can order entries numerically.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub table_key: TableKey,
}
