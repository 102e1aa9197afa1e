use async_trait::async_trait;
use aws_sdk_dynamodb::error::BuildError;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::error::Error;
use crate::partition::{KeyValue, PhysicalKey};
use crate::schema::TableSchema;
use crate::store::{BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, Record, StorePrimitives};

type PrimaryKey = (KeyValue, Option<KeyValue>);

#[derive(Debug)]
struct MemoryTable {
    hash_attribute: String,
    range_attribute: Option<String>,
    items: HashMap<PrimaryKey, Record>,
}

impl MemoryTable {
    fn item_key(&self, item: &Record) -> Result<PrimaryKey, Error> {
        let hash = item
            .get(&self.hash_attribute)
            .and_then(KeyValue::from_attribute)
            .ok_or_else(|| Error::MissingKeyAttribute(self.hash_attribute.clone()))?;
        let range = match &self.range_attribute {
            Some(attr) => Some(
                item.get(attr)
                    .and_then(KeyValue::from_attribute)
                    .ok_or_else(|| Error::MissingKeyAttribute(attr.clone()))?,
            ),
            None => None,
        };
        Ok((hash, range))
    }

    fn lookup_key(key: &PhysicalKey) -> PrimaryKey {
        (KeyValue::S(key.id.clone()), key.range.clone())
    }
}

/// In-memory store for tests and local development.
///
/// Tables are held in a concurrent map and behave like their remote
/// counterparts: unknown tables fail with [`Error::TableNotFound`], items
/// must carry the table's key attributes, and batch calls are rejected
/// with [`Error::BatchTooLarge`] past the DynamoDB per-call ceilings
/// instead of being chunked.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, MemoryTable>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorePrimitives for MemoryStore {
    async fn put_item(&self, table: &str, item: Record) -> Result<(), Error> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        let key = entry.item_key(&item)?;
        let _ = entry.items.insert(key, item);
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &PhysicalKey) -> Result<Option<Record>, Error> {
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        Ok(entry.items.get(&MemoryTable::lookup_key(key)).cloned())
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<PhysicalKey>,
    ) -> Result<Vec<Record>, Error> {
        if keys.len() > BATCH_GET_LIMIT {
            return Err(Error::BatchTooLarge {
                requested: keys.len(),
                limit: BATCH_GET_LIMIT,
            });
        }
        let entry = self
            .tables
            .get(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        Ok(keys
            .iter()
            .filter_map(|key| entry.items.get(&MemoryTable::lookup_key(key)).cloned())
            .collect())
    }

    async fn delete_item(&self, table: &str, key: &PhysicalKey) -> Result<(), Error> {
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        let _ = entry.items.remove(&MemoryTable::lookup_key(key));
        Ok(())
    }

    async fn batch_delete_item(&self, table: &str, keys: Vec<PhysicalKey>) -> Result<(), Error> {
        if keys.len() > BATCH_WRITE_LIMIT {
            return Err(Error::BatchTooLarge {
                requested: keys.len(),
                limit: BATCH_WRITE_LIMIT,
            });
        }
        let mut entry = self
            .tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        for key in &keys {
            let _ = entry.items.remove(&MemoryTable::lookup_key(key));
        }
        Ok(())
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<(), Error> {
        let Some(hash_attribute) = schema.hash_attribute() else {
            return Err(
                BuildError::missing_field("key_schema", "table schema has no hash key").into(),
            );
        };
        let _ = self
            .tables
            .entry(schema.table_name.clone())
            .or_insert_with(|| MemoryTable {
                hash_attribute: hash_attribute.to_string(),
                range_attribute: schema.range_attribute().map(str::to_string),
                items: HashMap::new(),
            });
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), Error> {
        let _ = self.tables.remove(table);
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, Error> {
        let mut names: Vec<String> = self.tables.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}
