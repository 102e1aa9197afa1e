/// In-memory store behavior
///
/// The store mirrors its remote counterpart: unknown tables fail,
/// items must carry the table's key attributes, and batch calls past
/// the per-call ceilings are rejected rather than chunked.
use serde_json::json;

mod helpers;
use dynamo_shard::store::{BATCH_GET_LIMIT, BATCH_WRITE_LIMIT};
use dynamo_shard::{Error, LogicalKey, MemoryStore, StorePrimitives, TableSchemaBuilder};
use helpers::*;

async fn store_with_table(name: &str) -> MemoryStore {
    let store = MemoryStore::new();
    let schema = TableSchemaBuilder::new(name).build().unwrap();
    store.create_table(&schema).await.unwrap();
    store
}

/// Test operations against a table that was never created
#[tokio::test]
async fn test_unknown_table_errors() {
    let store = MemoryStore::new();

    let put = store.put_item("ghost", record(json!({"id": "1"}))).await;
    assert!(matches!(put, Err(Error::TableNotFound(_))));

    let get = store.get_item("ghost", &LogicalKey::new("1")).await;
    assert!(matches!(get, Err(Error::TableNotFound(_))));
}

/// Test items must carry the table's key attributes
#[tokio::test]
async fn test_put_requires_key_attributes() {
    let store = MemoryStore::new();
    let schema = TableSchemaBuilder::new("scores")
        .hash_key("id", "string")
        .range_key("score", "number")
        .build()
        .unwrap();
    store.create_table(&schema).await.unwrap();

    let missing_hash = store
        .put_item("scores", record(json!({"score": 1, "ux": "x"})))
        .await;
    assert!(matches!(
        missing_hash,
        Err(Error::MissingKeyAttribute(attribute)) if attribute == "id"
    ));

    let missing_range = store
        .put_item("scores", record(json!({"id": "1", "ux": "x"})))
        .await;
    assert!(matches!(
        missing_range,
        Err(Error::MissingKeyAttribute(attribute)) if attribute == "score"
    ));
}

/// Test get and delete address items by hash and range together
#[tokio::test]
async fn test_get_and_delete_by_composite_key() {
    let store = MemoryStore::new();
    let schema = TableSchemaBuilder::new("scores")
        .hash_key("id", "string")
        .range_key("score", "number")
        .build()
        .unwrap();
    store.create_table(&schema).await.unwrap();

    store
        .put_item("scores", record(json!({"id": "1", "score": 2, "ux": "x"})))
        .await
        .unwrap();

    let hit = store
        .get_item("scores", &LogicalKey::with_range("1", 2.0))
        .await
        .unwrap();
    assert!(hit.is_some());

    let miss = store
        .get_item("scores", &LogicalKey::with_range("1", 3.0))
        .await
        .unwrap();
    assert!(miss.is_none());

    store
        .delete_item("scores", &LogicalKey::with_range("1", 2.0))
        .await
        .unwrap();
    let gone = store
        .get_item("scores", &LogicalKey::with_range("1", 2.0))
        .await
        .unwrap();
    assert!(gone.is_none());
}

/// Test absent keys are simply missing from a batch result
#[tokio::test]
async fn test_batch_get_skips_absent_keys() {
    let store = store_with_table("objects").await;
    store
        .put_item("objects", record(json!({"id": "1", "name": "Josh"})))
        .await
        .unwrap();

    let keys = vec![LogicalKey::new("1"), LogicalKey::new("2")];
    let records = store.batch_get_item("objects", keys).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(string_attribute(&records[0], "id"), "1");
}

/// Test batch get past the per-call ceiling is rejected
#[tokio::test]
async fn test_batch_get_rejects_oversized_call() {
    let store = store_with_table("objects").await;

    let keys: Vec<LogicalKey> = (0..=BATCH_GET_LIMIT)
        .map(|n| LogicalKey::new(format!("{n}")))
        .collect();
    let result = store.batch_get_item("objects", keys).await;
    assert!(matches!(
        result,
        Err(Error::BatchTooLarge {
            requested,
            limit: BATCH_GET_LIMIT,
        }) if requested == BATCH_GET_LIMIT + 1
    ));
}

/// Test batch delete past the per-call ceiling is rejected
#[tokio::test]
async fn test_batch_delete_rejects_oversized_call() {
    let store = store_with_table("objects").await;

    let keys: Vec<LogicalKey> = (0..=BATCH_WRITE_LIMIT)
        .map(|n| LogicalKey::new(format!("{n}")))
        .collect();
    let result = store.batch_delete_item("objects", keys).await;
    assert!(matches!(
        result,
        Err(Error::BatchTooLarge {
            requested,
            limit: BATCH_WRITE_LIMIT,
        }) if requested == BATCH_WRITE_LIMIT + 1
    ));
}

/// Test creating an existing table keeps its items
#[tokio::test]
async fn test_create_table_is_idempotent() {
    let store = store_with_table("objects").await;
    store
        .put_item("objects", record(json!({"id": "1", "name": "Josh"})))
        .await
        .unwrap();

    let schema = TableSchemaBuilder::new("objects").build().unwrap();
    store.create_table(&schema).await.unwrap();

    let still_there = store
        .get_item("objects", &LogicalKey::new("1"))
        .await
        .unwrap();
    assert!(still_there.is_some());
}

/// Test deleting tables, absent ones included
#[tokio::test]
async fn test_delete_table_tolerates_absent() {
    let store = store_with_table("objects").await;

    store.delete_table("objects").await.unwrap();
    store.delete_table("objects").await.unwrap();
    assert!(store.list_tables().await.unwrap().is_empty());
}

/// Test table listing is sorted by name
#[tokio::test]
async fn test_list_tables_sorted() {
    let store = MemoryStore::new();
    for name in ["zebra", "alpha", "middle"] {
        let schema = TableSchemaBuilder::new(name).build().unwrap();
        store.create_table(&schema).await.unwrap();
    }

    let tables = store.list_tables().await.unwrap();
    assert_eq!(
        tables,
        vec![
            "alpha".to_string(),
            "middle".to_string(),
            "zebra".to_string()
        ]
    );
}
