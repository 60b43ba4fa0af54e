//! End-to-end session scenarios against the in-memory store.

use chrono::{TimeZone, Utc};
use ledger_core::{
    LedgerError, LoadOrigin, SaveOutcome, Snapshot, TABLES, TableSession, audit_log, diff,
};
use ledger_model::{ChangeField, FieldValue, Row, RowId, TableKey, TeamRoster, TextField, UserId};
use ledger_store::{DocumentStore, Failpoint, MemoryStore};
use proptest::prelude::*;

fn roster() -> TeamRoster {
    TeamRoster::new(["", "", "", ""]).unwrap()
}

fn key() -> TableKey {
    TableKey::new("t1").unwrap()
}

fn initial() -> Vec<Row> {
    vec![
        Row::new(RowId::new(1), "A", 4),
        Row::new(RowId::new(2), "B", 4),
    ]
}

#[tokio::test]
async fn edit_save_and_reload() {
    let store = MemoryStore::new();
    let user = UserId::new("alice").unwrap();
    let mut session = TableSession::open(&store, key(), roster(), initial)
        .await
        .unwrap();
    assert_eq!(
        session.origin(),
        LoadOrigin::Fallback { written_back: true }
    );

    session.set_contribution(RowId::new(1), 1, "5").unwrap();
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
    let outcome = session.save_at(&store, &user, at).await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { ref entries } if entries.len() == 1));

    let reopened = TableSession::open(&store, key(), roster(), || {
        panic!("stored table expected")
    })
    .await
    .unwrap();
    assert_eq!(reopened.origin(), LoadOrigin::Stored);
    assert_eq!(reopened.rows(), session.rows());
    assert_eq!(reopened.rows()[0].contributions, vec![0, 5, 0, 0]);

    let log = audit_log(&store, &key()).await.unwrap();
    assert_eq!(log.len(), 1);
    let entry = &log[0];
    assert_eq!(entry.user, user);
    assert_eq!(entry.timestamp, at);
    assert_eq!(entry.table_key, key());
    assert_eq!(entry.change.row_label, "A");
    assert_eq!(
        entry.change.field,
        ChangeField::Contribution {
            slot: 1,
            team: "team-2".to_string()
        }
    );
    assert_eq!(entry.change.old_value, FieldValue::Count(0));
    assert_eq!(entry.change.new_value, FieldValue::Count(5));

    let table = store.get(TABLES, "t1").await.unwrap().unwrap();
    assert_eq!(table["updatedBy"], "alice");
}

#[tokio::test]
async fn audit_log_is_newest_first() {
    let store = MemoryStore::new();
    let user = UserId::new("bob").unwrap();
    let mut session = TableSession::open(&store, key(), roster(), initial)
        .await
        .unwrap();

    session
        .set_text(RowId::new(2), TextField::Synthese, "first")
        .unwrap();
    let early = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    session.save_at(&store, &user, early).await.unwrap();

    session
        .set_text(RowId::new(2), TextField::Synthese, "second")
        .unwrap();
    let late = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
    session.save_at(&store, &user, late).await.unwrap();

    let log = audit_log(&store, &key()).await.unwrap();
    let values: Vec<String> = log
        .iter()
        .map(|entry| entry.change.new_value.to_string())
        .collect();
    assert_eq!(values, ["second", "first"]);
}

#[tokio::test]
async fn saving_without_changes_writes_nothing() {
    let store = MemoryStore::new();
    let mut session = TableSession::open(&store, key(), roster(), initial)
        .await
        .unwrap();
    let before = store.write_count();

    let outcome = session
        .save(&store, &UserId::new("carol").unwrap())
        .await
        .unwrap();

    assert_eq!(outcome, SaveOutcome::NoChanges);
    assert_eq!(store.write_count(), before);
    assert!(audit_log(&store, &key()).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_commit_is_all_or_nothing() {
    let store = MemoryStore::new();
    let mut session = TableSession::open(&store, key(), roster(), initial)
        .await
        .unwrap();
    let stored_before = store.get(TABLES, "t1").await.unwrap();

    session.set_contribution(RowId::new(1), 0, "3").unwrap();
    session.set_contribution(RowId::new(2), 3, "7").unwrap();
    // Fails on the second audit entry, after the table overwrite was staged.
    store.inject(Failpoint::BatchAt(2));

    let result = session.save(&store, &UserId::new("dave").unwrap()).await;

    assert!(matches!(result, Err(LedgerError::Commit { .. })));
    assert!(session.is_dirty());
    assert_eq!(store.get(TABLES, "t1").await.unwrap(), stored_before);
    assert!(audit_log(&store, &key()).await.unwrap().is_empty());

    store.clear_failpoints();
    let retried = session
        .save(&store, &UserId::new("dave").unwrap())
        .await
        .unwrap();
    assert!(matches!(retried, SaveOutcome::Saved { ref entries } if entries.len() == 2));
    assert!(!session.is_dirty());
}

#[tokio::test]
async fn oversized_commit_is_refused_whole() {
    let store = MemoryStore::new().with_max_batch_ops(2);
    let mut session = TableSession::open(&store, key(), roster(), initial)
        .await
        .unwrap();
    session.set_contribution(RowId::new(1), 0, "1").unwrap();
    session.set_contribution(RowId::new(1), 1, "1").unwrap();

    let result = session.save(&store, &UserId::new("erin").unwrap()).await;

    assert!(matches!(result, Err(LedgerError::Commit { .. })));
    assert!(audit_log(&store, &key()).await.unwrap().is_empty());
}

fn arb_row(id: u64) -> impl Strategy<Value = Row> {
    (
        "[a-z]{0,6}",
        "[a-z]{0,6}",
        proptest::collection::vec(0u64..1_000, 4),
    )
        .prop_map(move |(thematique, nature, contributions)| {
            let mut row = Row::new(RowId::new(id), thematique, 4);
            row.nature = nature;
            row.contributions = contributions;
            row
        })
}

fn arb_table() -> impl Strategy<Value = Vec<Row>> {
    (0usize..6).prop_flat_map(|len| (1..=len as u64).map(arb_row).collect::<Vec<_>>())
}

proptest! {
    #[test]
    fn diff_against_own_snapshot_is_empty(rows in arb_table()) {
        prop_assert!(diff(&rows, &Snapshot::capture(&rows), &roster()).is_empty());
    }

    #[test]
    fn one_slot_edit_yields_one_record(
        rows in (1usize..6).prop_flat_map(|len| (1..=len as u64).map(arb_row).collect::<Vec<_>>()),
        pick in any::<prop::sample::Index>(),
        slot in 0usize..4,
        bump in 1u64..100,
    ) {
        let snapshot = Snapshot::capture(&rows);
        let mut working = rows.clone();
        let index = pick.index(working.len());
        working[index].contributions[slot] += bump;

        let changes = diff(&working, &snapshot, &roster());
        prop_assert_eq!(changes.len(), 1);
        prop_assert_eq!(changes[0].row_id, working[index].id);
        prop_assert_eq!(
            &changes[0].new_value,
            &FieldValue::Count(rows[index].contributions[slot] + bump)
        );
    }
}
