//! Adapter configuration.

use serde::{Deserialize, Serialize};
use std::env;

use crate::partition::PartitionCodec;

/// Default number of physical partitions per logical key.
pub const DEFAULT_PARTITION_SIZE: u32 = 200;

/// Partitioning configuration, passed to the adapter at construction.
///
/// Each adapter owns its own copy, so tables and tests can run with
/// different settings concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// Spread writes across partitions (default: false).
    pub partitioning: bool,
    /// Physical partitions per logical key; meaningful only when
    /// partitioning is enabled (default: 200).
    pub partition_size: u32,
    /// Attribute holding the logical id the write path suffixes
    /// (default: `"id"`).
    pub hash_attribute: String,
    /// Attribute stamped on partitioned writes and compared during
    /// reconciliation (default: `"updated_at"`).
    pub timestamp_attribute: String,
}

impl PartitionConfig {
    /// Configuration with partitioning enabled at the given size.
    pub fn partitioned(partition_size: u32) -> Self {
        Self {
            partitioning: true,
            partition_size,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `PARTITIONING` and `PARTITION_SIZE`, keeping the defaults for
    /// anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            partitioning: env_bool("PARTITIONING", false),
            partition_size: env_u32("PARTITION_SIZE", DEFAULT_PARTITION_SIZE),
            ..Self::default()
        }
    }

    /// The key codec this configuration implies.
    pub fn codec(&self) -> PartitionCodec {
        if self.partitioning {
            PartitionCodec::new(self.partition_size)
        } else {
            PartitionCodec::new(1)
        }
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            partitioning: false,
            partition_size: DEFAULT_PARTITION_SIZE,
            hash_attribute: "id".to_string(),
            timestamp_attribute: "updated_at".to_string(),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
