/// Test helpers and fixtures for adapter integration tests
///
/// This module provides the recording store, deterministic pickers and
/// record builders used across all integration tests.
pub mod fixtures;

pub use fixtures::{FixedPicker, RecordingStore, StoreCall};

#[allow(unused_imports)]
pub use fixtures::CyclingPicker;

use aws_sdk_dynamodb::types::AttributeValue;
use dynamo_shard::Record;
use serde_json::Value;

/// Build a raw record from a JSON value
pub fn record(value: Value) -> Record {
    serde_dynamo::to_item(value).expect("test record converts to an item")
}

/// String attribute of a record, panicking when absent or non-string
#[allow(dead_code)]
pub fn string_attribute<'a>(record: &'a Record, name: &str) -> &'a str {
    match record.get(name) {
        Some(AttributeValue::S(value)) => value,
        other => panic!("attribute {name:?} is not a string: {other:?}"),
    }
}

/// Sort records by their string `id` attribute for stable assertions
#[allow(dead_code)]
pub fn sorted_by_id(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|record| match record.get("id") {
        Some(AttributeValue::S(id)) => id.clone(),
        _ => String::new(),
    });
    records
}
