//! Partition-aware adapter over a keyed store.
//!
//! High-contention hash keys can be spread over several physical
//! partition slots so writes land on different items. The adapter owns
//! that translation: writes pick a slot and stamp a timestamp, reads
//! fan out over the whole slot span and keep the freshest copy per
//! logical id, deletes remove the whole span. With partitioning
//! disabled every operation passes straight through to the store.

use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::PartitionConfig;
use crate::error::Error;
use crate::partition::{
    KeyValue, LogicalKey, PartitionCodec, PartitionPicker, RandomPicker, RangeKeys,
};
use crate::schema::TableSchema;
use crate::store::{Record, StorePrimitives};

/// Client-side partitioning over a [`StorePrimitives`] implementation.
///
/// Construction fixes the configuration for the adapter's lifetime;
/// concurrent use from many tasks is fine since every operation takes
/// `&self`.
///
/// # Example
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamo_shard::{MemoryStore, PartitionConfig, PartitionedAdapter, TableSchemaBuilder};
/// use std::collections::HashMap;
///
/// async fn example() -> Result<(), dynamo_shard::Error> {
///     let config = PartitionConfig::partitioned(8);
///     let adapter = PartitionedAdapter::new(MemoryStore::new(), config);
///
///     let schema = TableSchemaBuilder::new("visits").build()?;
///     adapter.create_table(&schema).await?;
///
///     let mut visit = HashMap::new();
///     let _ = visit.insert("id".to_string(), AttributeValue::S("front-page".to_string()));
///     let _ = visit.insert("views".to_string(), AttributeValue::N("1".to_string()));
///     adapter.write("visits", visit).await?;
///
///     let latest = adapter.read("visits", "front-page", None).await?;
///     assert!(latest.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct PartitionedAdapter<S> {
    store: S,
    config: PartitionConfig,
    codec: PartitionCodec,
    picker: Box<dyn PartitionPicker>,
}

impl<S: StorePrimitives> PartitionedAdapter<S> {
    /// Adapter with uniformly random partition choice on writes.
    pub fn new(store: S, config: PartitionConfig) -> Self {
        Self::with_picker(store, config, Box::new(RandomPicker))
    }

    /// Adapter with an injected partition picker.
    ///
    /// Tests use this to pin writes to a known partition slot.
    pub fn with_picker(
        store: S,
        config: PartitionConfig,
        picker: Box<dyn PartitionPicker>,
    ) -> Self {
        let codec = config.codec();
        Self {
            store,
            config,
            codec,
            picker,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration the adapter was built with.
    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    /// Store one record.
    ///
    /// With partitioning enabled and the hash attribute present as a
    /// string, the value gains a `.N` partition suffix and the record is
    /// stamped with the current time under the timestamp attribute.
    /// Records without a string hash attribute pass through unchanged,
    /// as does everything when partitioning is disabled.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use aws_sdk_dynamodb::types::AttributeValue;
    /// use dynamo_shard::{MemoryStore, PartitionConfig, PartitionedAdapter};
    /// use std::collections::HashMap;
    ///
    /// async fn example() -> Result<(), dynamo_shard::Error> {
    ///     let adapter =
    ///         PartitionedAdapter::new(MemoryStore::new(), PartitionConfig::partitioned(8));
    ///
    ///     let mut visit = HashMap::new();
    ///     let _ = visit.insert("id".to_string(), AttributeValue::S("front-page".to_string()));
    ///     let _ = visit.insert("views".to_string(), AttributeValue::N("1".to_string()));
    ///
    ///     // Lands on one of front-page.0 through front-page.7
    ///     adapter.write("visits", visit).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn write(&self, table: &str, mut record: Record) -> Result<(), Error> {
        if self.codec.is_partitioned() {
            if let Some(AttributeValue::S(id)) = record.get(self.config.hash_attribute.as_str()) {
                let physical_id = format!("{}.{}", id, self.picker.pick(self.codec.count()));
                debug!(table, id = %physical_id, "assigned partition");
                let _ = record.insert(
                    self.config.hash_attribute.clone(),
                    AttributeValue::S(physical_id),
                );
                let _ = record.insert(
                    self.config.timestamp_attribute.clone(),
                    AttributeValue::N(epoch_seconds().to_string()),
                );
            }
        }

        self.store.put_item(table, record).await
    }

    /// Read the freshest copy of one logical record.
    ///
    /// With partitioning enabled this reads the record's whole partition
    /// span in one batched call and keeps the copy with the greatest
    /// timestamp; its hash attribute is rewritten back to the logical id
    /// before it is returned. Returns `None` when no partition holds a
    /// copy.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_shard::{MemoryStore, PartitionConfig, PartitionedAdapter};
    ///
    /// async fn example() -> Result<(), dynamo_shard::Error> {
    ///     let adapter =
    ///         PartitionedAdapter::new(MemoryStore::new(), PartitionConfig::partitioned(8));
    ///
    ///     match adapter.read("visits", "front-page", None).await? {
    ///         Some(record) => println!("latest copy: {record:?}"),
    ///         None => println!("never written"),
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub async fn read(
        &self,
        table: &str,
        id: &str,
        range: Option<KeyValue>,
    ) -> Result<Option<Record>, Error> {
        let key = LogicalKey {
            id: id.to_string(),
            range,
        };

        if !self.codec.is_partitioned() {
            return self.store.get_item(table, &key).await;
        }

        let physical = self.codec.expand_key(&key);
        debug!(table, id, partitions = physical.len(), "scatter read");
        let records = self.store.batch_get_item(table, physical).await?;
        let mut merged = self.reconcile(records)?;
        Ok(merged.pop())
    }

    /// Read the freshest copies of many logical records in one batched
    /// call.
    ///
    /// `range_keys` may broadcast a single range value to every id or
    /// supply one value per id positionally. Ids nothing was written for
    /// are simply missing from the result, and result order is
    /// unspecified.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use dynamo_shard::{MemoryStore, PartitionConfig, PartitionedAdapter, RangeKeys};
    ///
    /// async fn example() -> Result<(), dynamo_shard::Error> {
    ///     let adapter =
    ///         PartitionedAdapter::new(MemoryStore::new(), PartitionConfig::partitioned(8));
    ///
    ///     // Every id paired with range key 2.0
    ///     let records = adapter
    ///         .read_many(
    ///             "scores",
    ///             &["player-1", "player-2"],
    ///             Some(RangeKeys::Broadcast(2.0.into())),
    ///         )
    ///         .await?;
    ///     println!("found {} records", records.len());
    ///     Ok(())
    /// }
    /// ```
    pub async fn read_many<I>(
        &self,
        table: &str,
        ids: &[I],
        range_keys: Option<RangeKeys>,
    ) -> Result<Vec<Record>, Error>
    where
        I: AsRef<str> + Sync,
    {
        let keys = Self::logical_keys(ids, range_keys)?;

        if !self.codec.is_partitioned() {
            return self.store.batch_get_item(table, keys).await;
        }

        let physical = self.codec.expand_keys(&keys);
        debug!(
            table,
            requested = keys.len(),
            partitions = physical.len(),
            "scatter read"
        );
        let records = self.store.batch_get_item(table, physical).await?;
        self.reconcile(records)
    }

    /// Delete one logical record, clearing its whole partition span.
    pub async fn delete(
        &self,
        table: &str,
        id: &str,
        range: Option<KeyValue>,
    ) -> Result<(), Error> {
        let key = LogicalKey {
            id: id.to_string(),
            range,
        };

        if !self.codec.is_partitioned() {
            return self.store.delete_item(table, &key).await;
        }

        let physical = self.codec.expand_key(&key);
        debug!(table, id, partitions = physical.len(), "scatter delete");
        self.store.batch_delete_item(table, physical).await
    }

    /// Delete many logical records, clearing every partition span, in
    /// one batched call.
    ///
    /// `range_keys` follows the same broadcast and positional rules as
    /// [`read_many`](Self::read_many).
    pub async fn delete_many<I>(
        &self,
        table: &str,
        ids: &[I],
        range_keys: Option<RangeKeys>,
    ) -> Result<(), Error>
    where
        I: AsRef<str> + Sync,
    {
        let keys = Self::logical_keys(ids, range_keys)?;
        let physical = self.codec.expand_keys(&keys);
        self.store.batch_delete_item(table, physical).await
    }

    /// Create a table from a schema descriptor.
    ///
    /// Creating a table that already exists is not an error.
    pub async fn create_table(&self, schema: &TableSchema) -> Result<(), Error> {
        self.store.create_table(schema).await
    }

    /// Delete a table. Deleting an absent table is not an error.
    pub async fn delete_table(&self, table: &str) -> Result<(), Error> {
        self.store.delete_table(table).await
    }

    /// Names of all tables the store currently has.
    pub async fn list_tables(&self) -> Result<Vec<String>, Error> {
        self.store.list_tables().await
    }

    fn logical_keys<I>(ids: &[I], range_keys: Option<RangeKeys>) -> Result<Vec<LogicalKey>, Error>
    where
        I: AsRef<str>,
    {
        match range_keys {
            None => Ok(ids.iter().map(|id| LogicalKey::new(id.as_ref())).collect()),
            Some(RangeKeys::Broadcast(range)) => Ok(ids
                .iter()
                .map(|id| LogicalKey::with_range(id.as_ref(), range.clone()))
                .collect()),
            Some(RangeKeys::PerKey(ranges)) => {
                if ranges.len() != ids.len() {
                    return Err(Error::MismatchedRangeKeys {
                        ids: ids.len(),
                        range_keys: ranges.len(),
                    });
                }
                Ok(ids
                    .iter()
                    .zip(ranges)
                    .map(|(id, range)| LogicalKey::with_range(id.as_ref(), range))
                    .collect())
            }
        }
    }

    /// Collapse partition copies down to one record per logical id,
    /// keeping the greatest timestamp. Ties keep the copy seen first.
    fn reconcile(&self, records: Vec<Record>) -> Result<Vec<Record>, Error> {
        let hash_attribute = &self.config.hash_attribute;
        let mut latest: HashMap<String, (f64, Record)> = HashMap::new();

        for record in records {
            let physical_id = match record.get(hash_attribute.as_str()) {
                Some(AttributeValue::S(id)) => id.clone(),
                _ => return Err(Error::MissingKeyAttribute(hash_attribute.clone())),
            };
            let (logical_id, _) = PartitionCodec::decode(&physical_id)?;
            let timestamp = self.timestamp_of(&record);

            match latest.entry(logical_id) {
                Entry::Occupied(mut entry) => {
                    if timestamp > entry.get().0 {
                        let _ = entry.insert((timestamp, record));
                    }
                }
                Entry::Vacant(entry) => {
                    let _ = entry.insert((timestamp, record));
                }
            }
        }

        let mut merged = Vec::with_capacity(latest.len());
        for (logical_id, (_, mut record)) in latest {
            let _ = record.insert(hash_attribute.clone(), AttributeValue::S(logical_id));
            merged.push(record);
        }
        Ok(merged)
    }

    /// Timestamp of a record, or negative infinity when the attribute is
    /// absent or does not parse to an orderable number. NaN counts as
    /// missing. Copies without a usable timestamp lose reconciliation
    /// against any copy with one.
    fn timestamp_of(&self, record: &Record) -> f64 {
        match record.get(self.config.timestamp_attribute.as_str()) {
            Some(AttributeValue::N(value)) => value
                .parse()
                .ok()
                .filter(|stamp: &f64| !stamp.is_nan())
                .unwrap_or(f64::NEG_INFINITY),
            _ => f64::NEG_INFINITY,
        }
    }
}

fn epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const HOUR: f64 = 3600.0;
    const NOW: f64 = 1_700_000_000.0;

    fn adapter(partition_size: u32) -> PartitionedAdapter<MemoryStore> {
        PartitionedAdapter::new(
            MemoryStore::new(),
            PartitionConfig::partitioned(partition_size),
        )
    }

    fn copy(physical_id: &str, timestamp: Option<f64>, marker: &str) -> Record {
        let mut record = HashMap::new();
        let _ = record.insert(
            "id".to_string(),
            AttributeValue::S(physical_id.to_string()),
        );
        if let Some(timestamp) = timestamp {
            let _ = record.insert(
                "updated_at".to_string(),
                AttributeValue::N(timestamp.to_string()),
            );
        }
        let _ = record.insert("marker".to_string(), AttributeValue::S(marker.to_string()));
        record
    }

    fn marker_of(record: &Record) -> &str {
        match record.get("marker") {
            Some(AttributeValue::S(marker)) => marker,
            _ => panic!("record has no marker"),
        }
    }

    #[test]
    fn test_reconcile_keeps_freshest_copy_per_logical_id() {
        let adapter = adapter(4);
        let records = vec![
            copy("1.0", Some(NOW - 6.0 * HOUR), "stale"),
            copy("1.1", Some(NOW - 3.0 * HOUR), "old"),
            copy("1.2", Some(NOW - 1.0 * HOUR), "fresh"),
            copy("1.3", Some(NOW - 6.0 * HOUR), "stale"),
            copy("2.0", Some(NOW), "current"),
        ];

        let mut merged = adapter.reconcile(records).unwrap();
        merged.sort_by_key(|record| match record.get("id") {
            Some(AttributeValue::S(id)) => id.clone(),
            _ => String::new(),
        });

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].get("id"), Some(&AttributeValue::S("1".to_string())));
        assert_eq!(marker_of(&merged[0]), "fresh");
        assert_eq!(merged[1].get("id"), Some(&AttributeValue::S("2".to_string())));
        assert_eq!(marker_of(&merged[1]), "current");
    }

    #[test]
    fn test_reconcile_ties_keep_first_copy_seen() {
        let adapter = adapter(2);
        let records = vec![
            copy("1.0", Some(NOW), "first"),
            copy("1.1", Some(NOW), "second"),
        ];

        let merged = adapter.reconcile(records).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(marker_of(&merged[0]), "first");
    }

    #[test]
    fn test_reconcile_missing_timestamp_loses() {
        let adapter = adapter(2);
        let records = vec![
            copy("1.0", None, "untimed"),
            copy("1.1", Some(NOW - 6.0 * HOUR), "timed"),
        ];

        let merged = adapter.reconcile(records).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(marker_of(&merged[0]), "timed");
    }

    #[test]
    fn test_reconcile_nan_timestamp_loses() {
        let adapter = adapter(2);
        let records = vec![
            copy("1.0", Some(f64::NAN), "nan"),
            copy("1.1", Some(NOW - 6.0 * HOUR), "timed"),
        ];

        let merged = adapter.reconcile(records).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(marker_of(&merged[0]), "timed");
    }

    #[test]
    fn test_reconcile_rewrites_hash_attribute_to_logical_id() {
        let adapter = adapter(400);
        let records = vec![copy("12345.387327.-sdf3.4", Some(NOW), "dotted")];

        let merged = adapter.reconcile(records).unwrap();
        assert_eq!(
            merged[0].get("id"),
            Some(&AttributeValue::S("12345.387327.-sdf3".to_string()))
        );
    }

    #[test]
    fn test_reconcile_requires_hash_attribute() {
        let adapter = adapter(2);
        let mut record = HashMap::new();
        let _ = record.insert("views".to_string(), AttributeValue::N("1".to_string()));

        let result = adapter.reconcile(vec![record]);
        assert!(matches!(result, Err(Error::MissingKeyAttribute(_))));
    }

    #[test]
    fn test_logical_keys_broadcast_and_positional() {
        let broadcast = PartitionedAdapter::<MemoryStore>::logical_keys(
            &["1", "2"],
            Some(RangeKeys::Broadcast(2.0.into())),
        )
        .unwrap();
        assert_eq!(broadcast[0], LogicalKey::with_range("1", 2.0));
        assert_eq!(broadcast[1], LogicalKey::with_range("2", 2.0));

        let positional = PartitionedAdapter::<MemoryStore>::logical_keys(
            &["1", "2"],
            Some(RangeKeys::PerKey(vec![1.0.into(), 2.0.into()])),
        )
        .unwrap();
        assert_eq!(positional[0], LogicalKey::with_range("1", 1.0));
        assert_eq!(positional[1], LogicalKey::with_range("2", 2.0));

        let plain = PartitionedAdapter::<MemoryStore>::logical_keys(&["1"], None).unwrap();
        assert_eq!(plain[0], LogicalKey::new("1"));
    }

    #[test]
    fn test_logical_keys_rejects_mismatched_lengths() {
        let result = PartitionedAdapter::<MemoryStore>::logical_keys(
            &["1", "2", "3"],
            Some(RangeKeys::PerKey(vec![1.0.into()])),
        );
        assert!(matches!(
            result,
            Err(Error::MismatchedRangeKeys {
                ids: 3,
                range_keys: 1
            })
        ));
    }

    #[test]
    fn test_timestamp_of_handles_missing_and_malformed_values() {
        let adapter = adapter(2);

        let timed = copy("1.0", Some(123.5), "x");
        assert_eq!(adapter.timestamp_of(&timed), 123.5);

        let untimed = copy("1.0", None, "x");
        assert_eq!(adapter.timestamp_of(&untimed), f64::NEG_INFINITY);

        let mut malformed = copy("1.0", None, "x");
        let _ = malformed.insert(
            "updated_at".to_string(),
            AttributeValue::S("yesterday".to_string()),
        );
        assert_eq!(adapter.timestamp_of(&malformed), f64::NEG_INFINITY);

        let nan = copy("1.0", Some(f64::NAN), "x");
        assert_eq!(adapter.timestamp_of(&nan), f64::NEG_INFINITY);
    }
}
