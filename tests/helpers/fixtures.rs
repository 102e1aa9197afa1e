#![allow(dead_code)]

/// Common fixtures for adapter integration tests
///
/// Defines a store wrapper that records every primitive call it
/// receives, plus deterministic partition pickers.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use dynamo_shard::Error;
use dynamo_shard::partition::{PartitionPicker, PhysicalKey};
use dynamo_shard::schema::TableSchema;
use dynamo_shard::store::{MemoryStore, Record, StorePrimitives};

/// One recorded call against the wrapped store
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    PutItem { table: String, item: Record },
    GetItem { table: String, key: PhysicalKey },
    BatchGetItem { table: String, keys: Vec<PhysicalKey> },
    DeleteItem { table: String, key: PhysicalKey },
    BatchDeleteItem { table: String, keys: Vec<PhysicalKey> },
    CreateTable { name: String },
    DeleteTable { name: String },
    ListTables,
}

/// In-memory store that records the primitive calls the adapter makes
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls recorded so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StorePrimitives for RecordingStore {
    async fn put_item(&self, table: &str, item: Record) -> Result<(), Error> {
        self.record(StoreCall::PutItem {
            table: table.to_string(),
            item: item.clone(),
        });
        self.inner.put_item(table, item).await
    }

    async fn get_item(&self, table: &str, key: &PhysicalKey) -> Result<Option<Record>, Error> {
        self.record(StoreCall::GetItem {
            table: table.to_string(),
            key: key.clone(),
        });
        self.inner.get_item(table, key).await
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<PhysicalKey>,
    ) -> Result<Vec<Record>, Error> {
        self.record(StoreCall::BatchGetItem {
            table: table.to_string(),
            keys: keys.clone(),
        });
        self.inner.batch_get_item(table, keys).await
    }

    async fn delete_item(&self, table: &str, key: &PhysicalKey) -> Result<(), Error> {
        self.record(StoreCall::DeleteItem {
            table: table.to_string(),
            key: key.clone(),
        });
        self.inner.delete_item(table, key).await
    }

    async fn batch_delete_item(&self, table: &str, keys: Vec<PhysicalKey>) -> Result<(), Error> {
        self.record(StoreCall::BatchDeleteItem {
            table: table.to_string(),
            keys: keys.clone(),
        });
        self.inner.batch_delete_item(table, keys).await
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<(), Error> {
        self.record(StoreCall::CreateTable {
            name: schema.table_name.clone(),
        });
        self.inner.create_table(schema).await
    }

    async fn delete_table(&self, table: &str) -> Result<(), Error> {
        self.record(StoreCall::DeleteTable {
            name: table.to_string(),
        });
        self.inner.delete_table(table).await
    }

    async fn list_tables(&self) -> Result<Vec<String>, Error> {
        self.record(StoreCall::ListTables);
        self.inner.list_tables().await
    }
}

/// Picker that always chooses the same partition slot
#[derive(Debug)]
pub struct FixedPicker(pub u32);

impl PartitionPicker for FixedPicker {
    fn pick(&self, _count: u32) -> u32 {
        self.0
    }
}

/// Picker that walks the partition slots in order
#[derive(Debug, Default)]
pub struct CyclingPicker(AtomicU32);

impl PartitionPicker for CyclingPicker {
    fn pick(&self, count: u32) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed) % count
    }
}
