//! # Partitioned Key-Value Storage Adapter
//!
//! Client-side partitioning for DynamoDB-style hash/range keyed stores:
//! - Spread write-heavy hash keys over many physical partition slots
//! - Gather whole partition spans and reconcile to the freshest copy
//! - Batch operations with chunking, concurrency and retry built in
//! - Table lifecycle from plain schema descriptors
//!
//! ## Features
//!
//! - **Configuration-driven**: partitioning is a per-adapter setting, not
//!   global state, so tables and tests can run with different layouts
//! - **Async-first**: built on `tokio` and `aws-sdk-dynamodb`
//! - **Pluggable stores**: the adapter speaks one small trait; a
//!   DynamoDB-backed store and an in-memory store ship in the box
//! - **Batched fan-out**: span reads and deletes run as chunked,
//!   concurrent batch calls with automatic retry of unprocessed items
//! - **Transparent keys**: callers only ever see logical ids; partition
//!   suffixes stay inside the adapter
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aws_sdk_dynamodb::types::AttributeValue;
//! use dynamo_shard::{DynamoStore, Error, PartitionConfig, PartitionedAdapter};
//! use dynamo_shard::TableSchemaBuilder;
//! use std::collections::HashMap;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     // Spread each logical id over 8 physical partition slots
//!     let config = PartitionConfig::partitioned(8);
//!     let adapter = PartitionedAdapter::new(DynamoStore::from_env().await, config);
//!
//!     let schema = TableSchemaBuilder::new("visits").build()?;
//!     adapter.create_table(&schema).await?;
//!
//!     // Lands on one of the items front-page.0 through front-page.7
//!     let mut visit = HashMap::new();
//!     let _ = visit.insert("id".to_string(), AttributeValue::S("front-page".to_string()));
//!     let _ = visit.insert("views".to_string(), AttributeValue::N("1".to_string()));
//!     adapter.write("visits", visit).await?;
//!
//!     // Gathers the whole span and keeps the freshest copy
//!     let latest = adapter.read("visits", "front-page", None).await?;
//!     println!("latest: {latest:?}");
//!
//!     Ok(())
//! }
//! ```
#![deny(
    warnings,
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_parens,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results,
    deprecated,
    unknown_lints,
    unreachable_code,
    unused_mut
)]

mod error;
pub use error::Error;

/// Partition-aware adapter over a keyed store
pub mod adapter;

/// Adapter configuration
pub mod config;

/// Key expansion, reconciliation codec and partition pickers
pub mod partition;

/// Table schema descriptors
pub mod schema;

/// Backing store implementations
pub mod store;

// Re-export main types for convenience
pub use adapter::PartitionedAdapter;
pub use config::PartitionConfig;
pub use partition::{
    KeyValue, LogicalKey, PartitionCodec, PartitionPicker, PhysicalKey, RandomPicker, RangeKeys,
};
pub use schema::{TableSchema, TableSchemaBuilder};
pub use store::{DynamoStore, MemoryStore, Record, StorePrimitives};

// Re-export the attribute value type records are built from
pub use aws_sdk_dynamodb::types::AttributeValue;

// Re-export aws-config types for configuration
pub use aws_config::{
    BehaviorVersion, Region, SdkConfig, defaults,
    retry::{RetryConfig, RetryMode},
    timeout::TimeoutConfig,
};
