//! Command flows against a file-backed store in a temp directory.

use ledger_cli::commands::Ledger;
use ledger_cli::config::{LedgerConfig, TableEntry};
use ledger_core::{LoadOrigin, SaveOutcome};
use ledger_model::{ChangeField, FieldValue, RowId, TableKey, UserId};
use tempfile::TempDir;

fn config(dir: &TempDir) -> LedgerConfig {
    let mut config = LedgerConfig {
        teams: vec!["Nord".into(), "Sud".into()],
        store_path: Some(dir.path().join("ledger.json")),
        tables: vec![
            TableEntry {
                key: "t1".into(),
                label: "Premier".into(),
            },
            TableEntry {
                key: "t2".into(),
                label: String::new(),
            },
        ],
        ..LedgerConfig::default()
    };
    config.export.thousands_separator = " ".into();
    config
}

fn key(raw: &str) -> TableKey {
    TableKey::new(raw).unwrap()
}

fn alice() -> UserId {
    UserId::new("alice").unwrap()
}

#[tokio::test]
async fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();
    let labels = vec!["Eau".to_string(), "Sol".to_string()];

    let session = ledger.init_table(&key("t1"), &labels).await.unwrap();
    assert_eq!(
        session.origin(),
        LoadOrigin::Fallback { written_back: true }
    );
    assert_eq!(session.rows().len(), 2);

    let again = ledger
        .init_table(&key("t1"), &["Air".to_string()])
        .await
        .unwrap();
    assert_eq!(again.origin(), LoadOrigin::Stored);
    assert_eq!(again.rows()[1].thematique, "Sol");
}

#[tokio::test]
async fn set_field_records_one_audit_entry() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();
    ledger
        .init_table(&key("t1"), &["Eau".to_string()])
        .await
        .unwrap();

    let outcome = ledger
        .set_field(&key("t1"), RowId::new(1), "sud", "1200", &alice())
        .await
        .unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved { ref entries } if entries.len() == 1));

    let again = ledger
        .set_field(&key("t1"), RowId::new(1), "Sud", " 1200 ", &alice())
        .await
        .unwrap();
    assert_eq!(again, SaveOutcome::NoChanges);

    let log = ledger.audit(&key("t1")).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].change.field,
        ChangeField::Contribution {
            slot: 1,
            team: "Sud".into()
        }
    );
    assert_eq!(log[0].change.old_value, FieldValue::Count(0));
    assert_eq!(log[0].change.new_value, FieldValue::Count(1200));
}

#[tokio::test]
async fn unknown_field_or_row_is_rejected() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();
    ledger
        .init_table(&key("t1"), &["Eau".to_string()])
        .await
        .unwrap();

    assert!(
        ledger
            .set_field(&key("t1"), RowId::new(1), "est", "3", &alice())
            .await
            .is_err()
    );
    assert!(
        ledger
            .set_field(&key("t1"), RowId::new(9), "nature", "x", &alice())
            .await
            .is_err()
    );
    assert!(ledger.audit(&key("t1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn add_row_and_comment() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();
    ledger
        .init_table(&key("t1"), &["Eau".to_string()])
        .await
        .unwrap();

    let (id, outcome) = ledger.add_row(&key("t1"), " Sol ", &alice()).await.unwrap();
    assert_eq!(id, RowId::new(2));
    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    assert!(ledger.add_row(&key("t1"), "  ", &alice()).await.is_err());

    ledger
        .comment(&key("t1"), id, "à revoir", &alice())
        .await
        .unwrap();
    let session = ledger.open_table(&key("t1")).await.unwrap();
    let row = session.row(id).unwrap();
    assert_eq!(row.thematique, "Sol");
    assert_eq!(row.comments.get(&alice()).map(String::as_str), Some("à revoir"));

    ledger.comment(&key("t1"), id, "", &alice()).await.unwrap();
    let session = ledger.open_table(&key("t1")).await.unwrap();
    assert!(session.row(id).unwrap().comments.is_empty());
}

#[tokio::test]
async fn aggregate_and_export_configured_tables() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();
    ledger
        .init_table(&key("t1"), &["Eau".to_string(), "Sol".to_string()])
        .await
        .unwrap();
    ledger
        .init_table(&key("t2"), &["Eau".to_string()])
        .await
        .unwrap();
    ledger
        .set_field(&key("t1"), RowId::new(1), "nord", "1500", &alice())
        .await
        .unwrap();
    ledger
        .set_field(&key("t2"), RowId::new(1), "nord", "500", &alice())
        .await
        .unwrap();

    let aggregation = ledger.aggregate(&[]).await.unwrap();
    assert!(aggregation.is_complete());
    assert_eq!(aggregation.rows.len(), 2);
    assert_eq!(aggregation.rows[0].key(), "Eau");
    assert_eq!(aggregation.rows[0].row.contributions, vec![2000, 0]);
    assert_eq!(aggregation.rows[0].sources, vec![key("t1"), key("t2")]);

    let mut out = Vec::new();
    ledger.export(&aggregation.rows, &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "id,thematique,origine,difficulte,synthese,nature,estimation,\
             estimationComment,Nord,Sud,total"
        )
    );
    assert_eq!(lines.next(), Some("1,Eau,,,,,,,2 000,0,2 000"));
}

#[tokio::test]
async fn aggregate_without_tables_fails() {
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig {
        tables: Vec::new(),
        ..config(&dir)
    };
    let ledger = Ledger::open(config).unwrap();
    assert!(ledger.aggregate(&[]).await.is_err());
}

#[tokio::test]
async fn purge_removes_audit_then_table() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(LedgerConfig {
        max_batch_ops: 2,
        ..config(&dir)
    })
    .unwrap();
    ledger
        .init_table(&key("t1"), &["Eau".to_string()])
        .await
        .unwrap();
    for value in ["1", "2", "3"] {
        ledger
            .set_field(&key("t1"), RowId::new(1), "nord", value, &alice())
            .await
            .unwrap();
    }
    assert_eq!(ledger.audit(&key("t1")).await.unwrap().len(), 3);

    let report = ledger.purge(&key("t1"), false).await.unwrap();
    assert_eq!((report.deleted, report.batches), (3, 2));
    assert!(ledger.audit(&key("t1")).await.unwrap().is_empty());

    let report = ledger.purge(&key("t1"), true).await.unwrap();
    assert_eq!((report.deleted, report.batches), (1, 1));
    assert!(ledger.open_table(&key("t1")).await.is_err());
}

#[tokio::test]
async fn reading_an_absent_table_creates_nothing() {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(config(&dir)).unwrap();

    assert!(ledger.open_table(&key("typo")).await.is_err());
    assert!(
        ledger
            .set_field(&key("typo"), RowId::new(1), "nord", "1", &alice())
            .await
            .is_err()
    );
    assert!(!dir.path().join("ledger.json").exists());

    ledger
        .init_table(&key("t1"), &["Eau".to_string()])
        .await
        .unwrap();
    assert!(ledger.open_table(&key("typo")).await.is_err());
    let aggregation = ledger.aggregate(&[key("typo")]).await.unwrap();
    assert!(aggregation.rows.is_empty());
    assert!(ledger.init_table(&key("typo"), &[]).await.unwrap().rows().is_empty());
}
