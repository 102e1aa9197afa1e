use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, DeleteRequest, KeySchemaElement, KeyType,
    KeysAndAttributes, ProvisionedThroughput, ScalarAttributeType, WriteRequest,
};
use dashmap::DashMap;
use futures_util::{StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::{self as stream};
use tracing::warn;

use crate::error::Error;
use crate::partition::PhysicalKey;
use crate::schema::{KeyRole, ScalarType, TableSchema};
use crate::store::{BATCH_GET_LIMIT, BATCH_WRITE_LIMIT, Record, StorePrimitives};

const DEFAULT_CONCURRENCY: usize = 10;
const MAX_BATCH_RETRIES: usize = 2;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(2000);

type KeyMap = HashMap<String, AttributeValue>;

/// Key attribute names of a table, resolved once per process.
#[derive(Debug, Clone)]
struct TableKeys {
    hash: String,
    range: Option<String>,
}

/// DynamoDB-backed store.
///
/// Batch calls are chunked to the DynamoDB per-call ceilings and issued
/// concurrently; unprocessed items are retried with exponential backoff
/// before the remainder is surfaced as [`Error::UnprocessedItems`]. Key
/// attribute names are resolved through `DescribeTable` once per table
/// and cached.
#[derive(Debug)]
pub struct DynamoStore {
    client: Client,
    key_cache: DashMap<String, TableKeys>,
}

impl DynamoStore {
    /// Wrap an existing DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            key_cache: DashMap::new(),
        }
    }

    /// Build a store from shared AWS configuration with sensible defaults:
    ///
    /// - Adaptive retry mode with 3 max attempts
    /// - Exponential backoff starting at 1 second
    /// - Connect timeout: 3 seconds
    /// - Read timeout: 20 seconds
    /// - Operation timeout: 60 seconds
    /// - LocalStack support via AWS_PROFILE=localstack
    pub async fn from_env() -> Self {
        let config = aws_config_defaults().await;
        Self::new(Client::new(&config))
    }

    /// The wrapped DynamoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn table_keys(&self, table: &str) -> Result<TableKeys, Error> {
        if let Some(cached) = self.key_cache.get(table) {
            return Ok(cached.clone());
        }

        let output = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await?;
        let description = output
            .table
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;

        let mut hash = None;
        let mut range = None;
        for element in description.key_schema() {
            match element.key_type() {
                KeyType::Hash => hash = Some(element.attribute_name().to_string()),
                KeyType::Range => range = Some(element.attribute_name().to_string()),
                _ => {}
            }
        }

        let keys = TableKeys {
            hash: hash.ok_or_else(|| Error::TableNotFound(table.to_string()))?,
            range,
        };
        let _ = self.key_cache.insert(table.to_string(), keys.clone());
        Ok(keys)
    }

    /// One round of chunked concurrent batch gets; returns the fetched
    /// records and any keys DynamoDB left unprocessed.
    async fn batch_get_round(
        &self,
        table: &str,
        keys: Vec<KeyMap>,
    ) -> Result<(Vec<Record>, Vec<KeyMap>), Error> {
        let batches: Vec<KeysAndAttributes> = keys
            .chunks(BATCH_GET_LIMIT)
            .map(|chunk| {
                KeysAndAttributes::builder()
                    .set_keys(Some(chunk.to_vec()))
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let concurrency = batches.len().min(DEFAULT_CONCURRENCY);

        stream::iter(batches.into_iter().map(|batch| {
            self.client
                .batch_get_item()
                .request_items(table, batch)
                .send()
        }))
        .buffer_unordered(concurrency)
        .map_err(Into::<Error>::into)
        .try_fold(
            (Vec::new(), Vec::new()),
            |mut acc, output| async {
                if let Some(responses) = output.responses {
                    for items in responses.into_values() {
                        acc.0.extend(items);
                    }
                }

                if let Some(unprocessed) = output.unprocessed_keys {
                    for keys_attrs in unprocessed.into_values() {
                        acc.1.extend(keys_attrs.keys);
                    }
                }

                Ok(acc)
            },
        )
        .await
    }

    /// One round of chunked concurrent batch writes; returns the requests
    /// DynamoDB left unprocessed.
    async fn batch_write_round(
        &self,
        table: &str,
        requests: Vec<WriteRequest>,
    ) -> Result<Vec<WriteRequest>, Error> {
        let batches: Vec<Vec<WriteRequest>> = requests
            .chunks(BATCH_WRITE_LIMIT)
            .map(|chunk| chunk.to_vec())
            .collect();

        let concurrency = batches.len().min(DEFAULT_CONCURRENCY);

        stream::iter(batches.into_iter().map(|batch| {
            self.client
                .batch_write_item()
                .request_items(table, batch)
                .send()
        }))
        .buffer_unordered(concurrency)
        .map_err(Into::<Error>::into)
        .try_fold(Vec::new(), |mut unprocessed, output| async {
            if let Some(items) = output.unprocessed_items {
                for requests in items.into_values() {
                    unprocessed.extend(requests);
                }
            }

            Ok(unprocessed)
        })
        .await
    }
}

#[async_trait]
impl StorePrimitives for DynamoStore {
    async fn put_item(&self, table: &str, item: Record) -> Result<(), Error> {
        let _ = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await?;
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &PhysicalKey) -> Result<Option<Record>, Error> {
        let table_keys = self.table_keys(table).await?;
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key_map(&table_keys, key)))
            .send()
            .await?;
        Ok(output.item)
    }

    async fn batch_get_item(
        &self,
        table: &str,
        keys: Vec<PhysicalKey>,
    ) -> Result<Vec<Record>, Error> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let table_keys = self.table_keys(table).await?;
        let mut pending: Vec<KeyMap> = keys.iter().map(|key| key_map(&table_keys, key)).collect();
        let mut records = Vec::with_capacity(pending.len());
        let mut retry_count = 0;

        loop {
            let (found, unprocessed) = self.batch_get_round(table, pending).await?;
            records.extend(found);

            if unprocessed.is_empty() {
                return Ok(records);
            }
            if retry_count >= MAX_BATCH_RETRIES {
                return Err(Error::UnprocessedItems(unprocessed.len()));
            }

            warn!(
                table,
                unprocessed = unprocessed.len(),
                retry_count,
                "retrying unprocessed batch get keys"
            );
            sleep(retry_delay(retry_count, INITIAL_RETRY_DELAY, MAX_RETRY_DELAY)).await;
            retry_count += 1;
            pending = unprocessed;
        }
    }

    async fn delete_item(&self, table: &str, key: &PhysicalKey) -> Result<(), Error> {
        let table_keys = self.table_keys(table).await?;
        let _ = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(key_map(&table_keys, key)))
            .send()
            .await?;
        Ok(())
    }

    async fn batch_delete_item(&self, table: &str, keys: Vec<PhysicalKey>) -> Result<(), Error> {
        if keys.is_empty() {
            return Ok(());
        }

        let table_keys = self.table_keys(table).await?;
        let mut pending = Vec::with_capacity(keys.len());
        for key in &keys {
            let delete_request = DeleteRequest::builder()
                .set_key(Some(key_map(&table_keys, key)))
                .build()?;
            pending.push(
                WriteRequest::builder()
                    .set_delete_request(Some(delete_request))
                    .build(),
            );
        }

        let mut retry_count = 0;

        loop {
            let unprocessed = self.batch_write_round(table, pending).await?;

            if unprocessed.is_empty() {
                return Ok(());
            }
            if retry_count >= MAX_BATCH_RETRIES {
                return Err(Error::UnprocessedItems(unprocessed.len()));
            }

            warn!(
                table,
                unprocessed = unprocessed.len(),
                retry_count,
                "retrying unprocessed batch delete requests"
            );
            sleep(retry_delay(retry_count, INITIAL_RETRY_DELAY, MAX_RETRY_DELAY)).await;
            retry_count += 1;
            pending = unprocessed;
        }
    }

    async fn create_table(&self, schema: &TableSchema) -> Result<(), Error> {
        let mut builder = self
            .client
            .create_table()
            .table_name(&schema.table_name)
            .provisioned_throughput(
                ProvisionedThroughput::builder()
                    .read_capacity_units(schema.read_capacity)
                    .write_capacity_units(schema.write_capacity)
                    .build()?,
            );

        for definition in &schema.attribute_definitions {
            builder = builder.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(&definition.attribute_name)
                    .attribute_type(scalar_attribute_type(definition.attribute_type))
                    .build()?,
            );
        }

        for element in &schema.key_schema {
            builder = builder.key_schema(
                KeySchemaElement::builder()
                    .attribute_name(&element.attribute_name)
                    .key_type(sdk_key_type(element.key_type))
                    .build()?,
            );
        }

        // Tolerate ResourceInUseException - table already exists
        if let Err(e) = builder.send().await {
            let table_exists = matches!(
                e.as_service_error(),
                Some(CreateTableError::ResourceInUseException(_))
            );
            if !table_exists {
                return Err(e.into());
            }
        }

        if let Some(hash) = schema.hash_attribute() {
            let _ = self.key_cache.insert(
                schema.table_name.clone(),
                TableKeys {
                    hash: hash.to_string(),
                    range: schema.range_attribute().map(str::to_string),
                },
            );
        }

        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), Error> {
        let _ = self.key_cache.remove(table);

        // Tolerate ResourceNotFoundException - table already gone
        if let Err(e) = self.client.delete_table().table_name(table).send().await {
            let already_gone = matches!(
                e.as_service_error(),
                Some(DeleteTableError::ResourceNotFoundException(_))
            );
            if !already_gone {
                return Err(e.into());
            }
        }

        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>, Error> {
        let mut names = Vec::new();
        let mut start_table = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start_table)
                .send()
                .await?;

            if let Some(batch) = output.table_names {
                names.extend(batch);
            }

            start_table = output.last_evaluated_table_name;
            if start_table.is_none() {
                return Ok(names);
            }
        }
    }
}

fn key_map(table_keys: &TableKeys, key: &PhysicalKey) -> KeyMap {
    let mut map = HashMap::new();
    let _ = map.insert(table_keys.hash.clone(), AttributeValue::S(key.id.clone()));
    if let (Some(range_attribute), Some(range)) = (&table_keys.range, &key.range) {
        let _ = map.insert(range_attribute.clone(), AttributeValue::from(range));
    }
    map
}

fn scalar_attribute_type(scalar: ScalarType) -> ScalarAttributeType {
    match scalar {
        ScalarType::String => ScalarAttributeType::S,
        ScalarType::Number => ScalarAttributeType::N,
        ScalarType::Binary => ScalarAttributeType::B,
    }
}

fn sdk_key_type(role: KeyRole) -> KeyType {
    match role {
        KeyRole::Hash => KeyType::Hash,
        KeyRole::Range => KeyType::Range,
    }
}

/// Calculate retry delay with exponential backoff
fn retry_delay(attempt: usize, initial: Duration, max: Duration) -> Duration {
    let delay_ms = initial.as_millis() as u64 * 2u64.pow(attempt as u32);
    let capped_delay = delay_ms.min(max.as_millis() as u64);
    Duration::from_millis(capped_delay)
}

/// Shared AWS config with the retry, timeout and LocalStack defaults
/// described on [`DynamoStore::from_env`].
async fn aws_config_defaults() -> SdkConfig {
    use aws_config::BehaviorVersion;
    use aws_config::retry::RetryConfig;
    use aws_config::timeout::TimeoutConfig;

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    // Support LocalStack via AWS_PROFILE=localstack
    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}
