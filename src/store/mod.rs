//! Store primitive implementations.
//!
//! The adapter consumes stores only through [`StorePrimitives`]; the
//! concrete implementation is injected at construction. [`DynamoStore`]
//! talks to DynamoDB, [`MemoryStore`] keeps everything in process for
//! tests and local development.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::fmt;

use crate::error::Error;
use crate::partition::PhysicalKey;
use crate::schema::TableSchema;

mod dynamo;
mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

/// Item attribute map as stored.
pub type Record = HashMap<String, AttributeValue>;

/// DynamoDB's per-call ceiling on batch get keys.
pub const BATCH_GET_LIMIT: usize = 100;

/// DynamoDB's per-call ceiling on batch write requests.
pub const BATCH_WRITE_LIMIT: usize = 25;

/// Primitive operations the adapter requires of a backing store.
///
/// Hash key values are strings; range key values keep their scalar type.
/// Errors from the store propagate unchanged through the adapter.
#[async_trait]
pub trait StorePrimitives: fmt::Debug + Send + Sync {
    /// Store one item, replacing any existing item with the same key.
    async fn put_item(&self, table: &str, item: Record) -> Result<(), Error>;

    /// Fetch one item by key; `None` when absent.
    async fn get_item(&self, table: &str, key: &PhysicalKey) -> Result<Option<Record>, Error>;

    /// Fetch many items in one batched call. Absent keys are simply
    /// missing from the result.
    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<PhysicalKey>,
    ) -> Result<Vec<Record>, Error>;

    /// Delete one item by key. Deleting an absent key is not an error.
    async fn delete_item(&self, table: &str, key: &PhysicalKey) -> Result<(), Error>;

    /// Delete many items in one batched call.
    async fn batch_delete_item(&self, table: &str, keys: Vec<PhysicalKey>) -> Result<(), Error>;

    /// Create a table from a schema descriptor. Creating a table that
    /// already exists is not an error.
    async fn create_table(&self, schema: &TableSchema) -> Result<(), Error>;

    /// Delete a table. Deleting an absent table is not an error.
    async fn delete_table(&self, table: &str) -> Result<(), Error>;

    /// Names of all tables the store currently has.
    async fn list_tables(&self) -> Result<Vec<String>, Error>;
}
