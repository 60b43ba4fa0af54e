//! Rows merged across several tables.

use serde::{Deserialize, Serialize};

use crate::ids::TableKey;
use crate::row::Row;

/// One consolidated row per thematic label.
///
/// `row.contributions` holds the elementwise sum over every source row with
/// the same `thematique`; all descriptive fields come from the first source
/// row encountered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    #[serde(flatten)]
    pub row: Row,
    /// Tables that contributed at least one row, in fold order.
    pub sources: Vec<TableKey>,
}

impl AggregatedRow {
    pub fn key(&self) -> &str {
        &self.row.thematique
    }
}

impl AsRef<Row> for AggregatedRow {
    fn as_ref(&self) -> &Row {
        &self.row
    }
}
