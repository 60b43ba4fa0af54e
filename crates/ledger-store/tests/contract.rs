//! Contract tests run against every bundled store.

use ledger_store::{DocFilter, DocumentStore, FileStore, MemoryStore, OrderBy, WriteOp};
use serde_json::json;
use tempfile::tempdir;

async fn exercise_contract(store: &dyn DocumentStore) {
    // Upsert then overwrite.
    store.set("tables", "t1", json!({"rows": [1]})).await.unwrap();
    store.set("tables", "t1", json!({"rows": [2]})).await.unwrap();
    assert_eq!(
        store.get("tables", "t1").await.unwrap(),
        Some(json!({"rows": [2]}))
    );

    // Batches mix sets and deletes.
    store
        .batch_write(vec![
            WriteOp::set("audit", "e1", json!({"tableKey": "t1", "timestamp": 10})),
            WriteOp::set("audit", "e2", json!({"tableKey": "t2", "timestamp": 20})),
            WriteOp::set("audit", "e3", json!({"tableKey": "t1", "timestamp": 30})),
            WriteOp::delete("tables", "t1"),
        ])
        .await
        .unwrap();
    assert!(store.get("tables", "t1").await.unwrap().is_none());

    // Filtered, ordered query.
    let docs = store
        .query(
            "audit",
            &DocFilter::eq("tableKey", "t1"),
            Some(&OrderBy::desc("timestamp")),
        )
        .await
        .unwrap();
    let keys: Vec<&str> = docs.iter().map(|(key, _)| key.as_str()).collect();
    assert_eq!(keys, ["e3", "e1"]);

    // Deleting an absent document is not an error.
    store
        .batch_write(vec![WriteOp::delete("audit", "missing")])
        .await
        .unwrap();
}

#[tokio::test]
async fn memory_store_honours_contract() {
    let store = MemoryStore::new();
    exercise_contract(&store).await;
}

#[tokio::test]
async fn file_store_honours_contract() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path().join("ledger.json"));
    exercise_contract(&store).await;
}
