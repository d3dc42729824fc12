//! AWS SDK implementations of the adapter traits.
//!
//! Handlers are synchronous, so each adapter bridges into the Lambda's tokio
//! runtime with `block_in_place`. The runtime must be multi-threaded.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use aws_sdk_dynamodb::types::{AttributeValue, PutRequest, WriteRequest};

use crate::adapters::alerts::AlertPublisher;
use crate::adapters::object_source::ObjectSource;
use crate::adapters::table::{InventoryReader, InventoryWriter};
use crate::runtime::contract::{
    count_from_attribute, InventoryItemView, InventoryRecord, COUNT_ATTRIBUTE, ITEM_ATTRIBUTE,
    STORE_ATTRIBUTE,
};

pub type DynamoItem = HashMap<String, AttributeValue>;

const MAX_UNPROCESSED_RETRIES: u32 = 5;
const UNPROCESSED_BACKOFF_MS: u64 = 100;

fn block_on_current<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub struct S3ObjectSource {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectSource {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }

    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let output = self
            .s3_client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| format!("failed to read s3://{bucket}/{key}: {error}"))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|error| format!("failed to stream s3://{bucket}/{key}: {error}"))?;
        Ok(body.into_bytes().to_vec())
    }
}

impl ObjectSource for S3ObjectSource {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        block_on_current(self.fetch(bucket, key))
    }
}

pub struct DynamoInventoryTable {
    table_name: String,
    ddb_client: aws_sdk_dynamodb::Client,
}

impl DynamoInventoryTable {
    pub fn new(table_name: impl Into<String>, ddb_client: aws_sdk_dynamodb::Client) -> Self {
        Self {
            table_name: table_name.into(),
            ddb_client,
        }
    }

    async fn write_records(&self, records: &[InventoryRecord]) -> Result<(), String> {
        let pending = records
            .iter()
            .map(put_request)
            .collect::<Result<Vec<_>, _>>()?;

        write_until_processed(pending, UnprocessedRetry::DEFAULT, |batch| async move {
            let output = self
                .ddb_client
                .batch_write_item()
                .request_items(self.table_name.as_str(), batch)
                .send()
                .await
                .map_err(|error| format!("failed to batch write inventory items: {error}"))?;

            Ok(output
                .unprocessed_items()
                .and_then(|items| items.get(&self.table_name))
                .cloned()
                .unwrap_or_default())
        })
        .await
    }

    async fn query_items(&self, store: &str) -> Result<Vec<InventoryItemView>, String> {
        let items = collect_pages(|start_key| async move {
            let output = self
                .ddb_client
                .query()
                .table_name(self.table_name.as_str())
                .key_condition_expression("#store = :store")
                .expression_attribute_names("#store", STORE_ATTRIBUTE)
                .expression_attribute_values(":store", AttributeValue::S(store.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|error| format!("failed to query store '{store}': {error}"))?;

            Ok((
                output.items().to_vec(),
                output.last_evaluated_key().cloned(),
            ))
        })
        .await?;

        Ok(items.iter().map(item_to_view).collect())
    }

    async fn scan_items(&self) -> Result<Vec<InventoryItemView>, String> {
        let items = collect_pages(|start_key| async move {
            let output = self
                .ddb_client
                .scan()
                .table_name(self.table_name.as_str())
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|error| format!("failed to scan inventory table: {error}"))?;

            Ok((
                output.items().to_vec(),
                output.last_evaluated_key().cloned(),
            ))
        })
        .await?;

        Ok(items.iter().map(item_to_view).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnprocessedRetry {
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl UnprocessedRetry {
    pub const DEFAULT: Self = Self {
        max_retries: MAX_UNPROCESSED_RETRIES,
        base_backoff: Duration::from_millis(UNPROCESSED_BACKOFF_MS),
    };
}

/// Sends `pending`, then resends whatever `send` reports back as unprocessed
/// with exponential backoff until nothing is left or retries run out.
pub async fn write_until_processed<W, F, Fut>(
    mut pending: Vec<W>,
    retry: UnprocessedRetry,
    mut send: F,
) -> Result<(), String>
where
    F: FnMut(Vec<W>) -> Fut,
    Fut: Future<Output = Result<Vec<W>, String>>,
{
    let mut attempt = 0u32;
    while !pending.is_empty() {
        if attempt > retry.max_retries {
            return Err(format!(
                "{} inventory items left unprocessed after {} retries",
                pending.len(),
                retry.max_retries
            ));
        }
        if attempt > 0 {
            tokio::time::sleep(retry.base_backoff.saturating_mul(1 << attempt)).await;
        }

        pending = send(pending).await?;
        attempt += 1;
    }

    Ok(())
}

/// Follows `LastEvaluatedKey` until a page comes back without one.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<DynamoItem>, String>
where
    F: FnMut(Option<DynamoItem>) -> Fut,
    Fut: Future<Output = Result<(Vec<DynamoItem>, Option<DynamoItem>), String>>,
{
    let mut items = Vec::new();
    let mut start_key: Option<DynamoItem> = None;

    loop {
        let (page, last_key) = fetch_page(start_key.take()).await?;
        items.extend(page);
        match last_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => return Ok(items),
        }
    }
}

impl InventoryWriter for DynamoInventoryTable {
    fn write_batch(&self, records: &[InventoryRecord]) -> Result<(), String> {
        block_on_current(self.write_records(records))
    }
}

impl InventoryReader for DynamoInventoryTable {
    fn query_store(&self, store: &str) -> Result<Vec<InventoryItemView>, String> {
        block_on_current(self.query_items(store))
    }

    fn scan_all(&self) -> Result<Vec<InventoryItemView>, String> {
        block_on_current(self.scan_items())
    }
}

pub struct SnsAlertPublisher {
    topic_arn: String,
    sns_client: aws_sdk_sns::Client,
}

impl SnsAlertPublisher {
    pub fn new(topic_arn: impl Into<String>, sns_client: aws_sdk_sns::Client) -> Self {
        Self {
            topic_arn: topic_arn.into(),
            sns_client,
        }
    }

    async fn send(&self, subject: &str, message: &str) -> Result<(), String> {
        self.sns_client
            .publish()
            .topic_arn(self.topic_arn.as_str())
            .subject(subject)
            .message(message)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| format!("failed to publish low stock alert: {error}"))
    }
}

impl AlertPublisher for SnsAlertPublisher {
    fn publish(&self, subject: &str, message: &str) -> Result<(), String> {
        block_on_current(self.send(subject, message))
    }
}

pub fn record_to_item(record: &InventoryRecord) -> DynamoItem {
    HashMap::from([
        (
            STORE_ATTRIBUTE.to_string(),
            AttributeValue::S(record.store.clone()),
        ),
        (
            ITEM_ATTRIBUTE.to_string(),
            AttributeValue::S(record.item.clone()),
        ),
        (
            COUNT_ATTRIBUTE.to_string(),
            AttributeValue::N(record.count.to_string()),
        ),
    ])
}

pub fn item_to_view(item: &DynamoItem) -> InventoryItemView {
    let text = |name: &str| {
        item.get(name)
            .and_then(|value| value.as_s().ok())
            .cloned()
    };

    InventoryItemView {
        store: text(STORE_ATTRIBUTE),
        item: text(ITEM_ATTRIBUTE),
        count: item
            .get(COUNT_ATTRIBUTE)
            .and_then(|value| value.as_n().ok())
            .and_then(|raw| count_from_attribute(raw)),
    }
}

fn put_request(record: &InventoryRecord) -> Result<WriteRequest, String> {
    let put = PutRequest::builder()
        .set_item(Some(record_to_item(record)))
        .build()
        .map_err(|error| format!("failed to build put request: {error}"))?;
    Ok(WriteRequest::builder().put_request(put).build())
}
