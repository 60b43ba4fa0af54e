//! Tests for ledger-model types.

use ledger_model::{
    AggregatedRow, Row, RowId, TableDocument, TableKey, TeamRoster, UserId, coerce_slot,
};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn table_document_round_trips() {
    let mut row = Row::new(RowId::new(3), "Mobilite", 4);
    row.contributions[1] = 5;
    row.comments
        .insert(UserId::new("carol").unwrap(), "to review".to_string());
    let doc = TableDocument::new(vec![row]);

    let json = serde_json::to_string(&doc).expect("serialize table");
    let back: TableDocument = serde_json::from_str(&json).expect("deserialize table");
    assert_eq!(back, doc);
}

#[test]
fn aggregated_row_flattens_row_fields() {
    let aggregated = AggregatedRow {
        row: Row::new(RowId::new(1), "X", 2),
        sources: vec![TableKey::new("t1").unwrap()],
    };
    let value = serde_json::to_value(&aggregated).unwrap();
    assert_eq!(value["thematique"], "X");
    assert_eq!(value["sources"], json!(["t1"]));
    assert_eq!(aggregated.key(), "X");
}

#[test]
fn roster_slot_labels_are_one_based() {
    let roster = TeamRoster::new(["", "", "", ""]).unwrap();
    assert_eq!(roster.len(), 4);
    assert_eq!(roster.name(1), "team-2");
}

proptest! {
    #[test]
    fn coerce_slot_keeps_non_negative_integers(value in any::<u64>()) {
        prop_assert_eq!(coerce_slot(&json!(value)), value);
        prop_assert_eq!(coerce_slot(&json!(value.to_string())), value);
    }

    #[test]
    fn coerce_slot_zeroes_negative_numbers(value in i64::MIN..0) {
        prop_assert_eq!(coerce_slot(&json!(value)), 0);
    }
}
