use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use rand::RngExt;
use std::fmt;

use crate::error::Error;

/// Scalar key attribute value.
///
/// Numbers are kept in the store's string form, so the type is hashable
/// and round-trips without float formatting surprises.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// String value
    S(String),
    /// Number value
    N(String),
    /// Binary value
    B(Vec<u8>),
}

impl KeyValue {
    /// Extract a key scalar from a store attribute value, if it is one.
    pub fn from_attribute(value: &AttributeValue) -> Option<Self> {
        match value {
            AttributeValue::S(s) => Some(KeyValue::S(s.clone())),
            AttributeValue::N(n) => Some(KeyValue::N(n.clone())),
            AttributeValue::B(b) => Some(KeyValue::B(b.as_ref().to_vec())),
            _ => None,
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::S(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::S(value)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        KeyValue::N(value.to_string())
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::N(value.to_string())
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(value: Vec<u8>) -> Self {
        KeyValue::B(value)
    }
}

impl From<&KeyValue> for AttributeValue {
    fn from(value: &KeyValue) -> Self {
        match value {
            KeyValue::S(s) => AttributeValue::S(s.clone()),
            KeyValue::N(n) => AttributeValue::N(n.clone()),
            KeyValue::B(b) => AttributeValue::B(Blob::new(b.clone())),
        }
    }
}

/// Caller-visible primary key of a logical record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalKey {
    /// Hash key value
    pub id: String,
    /// Optional range key value
    pub range: Option<KeyValue>,
}

impl LogicalKey {
    /// Key with a hash value only.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            range: None,
        }
    }

    /// Key with hash and range values.
    pub fn with_range(id: impl Into<String>, range: impl Into<KeyValue>) -> Self {
        Self {
            id: id.into(),
            range: Some(range.into()),
        }
    }
}

/// Key addressed to one physical partition slot.
///
/// Same shape as [`LogicalKey`]; the id carries a `.N` suffix when
/// partitioning is enabled, and none when it is disabled.
pub type PhysicalKey = LogicalKey;

/// Range key values accompanying a batch of ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeKeys {
    /// One value applied to every id in the batch
    Broadcast(KeyValue),
    /// One value per id, aligned positionally
    PerKey(Vec<KeyValue>),
}

/// Maps logical keys onto their physical partition slots and back.
///
/// With a count of 1 the codec is the identity: keys pass through without
/// a suffix, which is how disabled partitioning avoids special-casing at
/// call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCodec {
    count: u32,
}

impl PartitionCodec {
    /// Codec spreading keys across `count` partitions; any count below 2
    /// disables partitioning.
    pub fn new(count: u32) -> Self {
        Self {
            count: count.max(1),
        }
    }

    /// Number of physical partitions per logical key.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Whether keys are spread across more than one partition.
    pub fn is_partitioned(&self) -> bool {
        self.count > 1
    }

    /// Expand one logical key into its ordered set of physical keys.
    ///
    /// Suffixes run `0..count`; the range value is carried through
    /// unchanged. The identity when partitioning is disabled.
    pub fn expand_key(&self, key: &LogicalKey) -> Vec<PhysicalKey> {
        if !self.is_partitioned() {
            return vec![key.clone()];
        }
        (0..self.count)
            .map(|index| PhysicalKey {
                id: format!("{}.{}", key.id, index),
                range: key.range.clone(),
            })
            .collect()
    }

    /// Expand a batch of logical keys, preserving input order: every
    /// physical key of element 1 comes before any of element 2.
    pub fn expand_keys(&self, keys: &[LogicalKey]) -> Vec<PhysicalKey> {
        keys.iter().flat_map(|key| self.expand_key(key)).collect()
    }

    /// Split a physical hash value into its logical id and partition index.
    ///
    /// Logical ids may themselves contain dots, so only the portion after
    /// the last dot is read as the partition index. Values without a dot
    /// (or with a non-numeric suffix) fail with
    /// [`Error::MissingPartitionSuffix`]; such values are only produced by
    /// disabled partitioning and should never reach this function.
    pub fn decode(physical_id: &str) -> Result<(String, u32), Error> {
        let Some((id, suffix)) = physical_id.rsplit_once('.') else {
            return Err(Error::MissingPartitionSuffix(physical_id.to_string()));
        };
        let index = suffix
            .parse()
            .map_err(|_| Error::MissingPartitionSuffix(physical_id.to_string()))?;
        Ok((id.to_string(), index))
    }
}

/// Source of partition indices for writes.
///
/// Injected at adapter construction so tests can pin the chosen partition;
/// [`RandomPicker`] is the production implementation.
pub trait PartitionPicker: fmt::Debug + Send + Sync {
    /// Pick an index in `[0, count)`. `count` is always at least 1.
    fn pick(&self, count: u32) -> u32;
}

/// Uniformly random partition choice.
///
/// Uses the thread-local generator, so concurrent callers share no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPicker;

impl PartitionPicker for RandomPicker {
    fn pick(&self, count: u32) -> u32 {
        rand::rng().random_range(0..count)
    }
}
