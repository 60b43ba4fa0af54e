#![deny(unsafe_code)]

use chrono::{DateTime, Utc};

use crate::ids::{RowId, UserId};
use crate::row::Row;

/// Stored shape of one table: the full row collection, overwritten as a whole
/// on every commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TableDocument {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            updated_by: None,
            updated_at: None,
        }
    }

    pub fn stamped(mut self, user: &UserId, at: DateTime<Utc>) -> Self {
        self.updated_by = Some(user.clone());
        self.updated_at = Some(at);
        self
    }

    pub fn next_row_id(&self) -> RowId {
        RowId::next_after(self.rows.iter().map(|row| row.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_default() {
        let doc: TableDocument = serde_json::from_value(json!({})).unwrap();
        assert!(doc.rows.is_empty());
        assert_eq!(doc.next_row_id(), RowId::FIRST);
    }

    #[test]
    fn unstamped_document_omits_metadata() {
        let doc = TableDocument::new(vec![Row::new(RowId::new(1), "A", 1)]);
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("updatedAt").is_none());
        assert_eq!(doc.next_row_id(), RowId::new(2));
    }
}
