/// Example: Spreading a write-hot key over many partition slots
///
/// Runs against the in-memory store, so it needs no AWS credentials.
/// Rapid writes to one logical id land on different physical items; a
/// single read gathers the whole span and returns only the freshest
/// copy under the original id.

use std::collections::HashMap;

use dynamo_shard::{
    AttributeValue, MemoryStore, PartitionConfig, PartitionedAdapter, TableSchemaBuilder,
};

#[tokio::main]
async fn main() -> Result<(), dynamo_shard::Error> {
    let config = PartitionConfig::partitioned(8);
    let adapter = PartitionedAdapter::new(MemoryStore::new(), config);

    let schema = TableSchemaBuilder::new("visits").build()?;
    adapter.create_table(&schema).await?;
    println!("✓ Created table with 8 partition slots per logical id");

    // Simulate contention: many writers updating one hot key
    for views in 1..=20 {
        let mut visit = HashMap::new();
        let _ = visit.insert(
            "id".to_string(),
            AttributeValue::S("front-page".to_string()),
        );
        let _ = visit.insert("views".to_string(), AttributeValue::N(views.to_string()));
        adapter.write("visits", visit).await?;
    }
    println!("✓ Wrote 20 updates to the logical id \"front-page\"");

    // One gather returns the freshest copy, suffix stripped
    match adapter.read("visits", "front-page", None).await? {
        Some(record) => {
            if let Some(AttributeValue::N(views)) = record.get("views") {
                println!("✓ Freshest copy has views = {views}");
            }
            if let Some(AttributeValue::S(id)) = record.get("id") {
                println!("✓ Caller sees the logical id: {id:?}");
            }
        }
        None => println!("⚠ No copy found"),
    }

    // Deleting clears the whole partition span in one batched call
    adapter.delete("visits", "front-page", None).await?;
    let after = adapter.read("visits", "front-page", None).await?;
    println!("✓ After delete, read returns: {after:?}");

    Ok(())
}
