use std::collections::HashMap;
use std::fs;
use std::path::Path;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_s3::primitives::ByteStream;
use inventory_core::contract::{COUNT_ATTRIBUTE, ITEM_ATTRIBUTE, STORE_ATTRIBUTE};
use inventory_core::naming::ResourceNames;
use serde_json::{json, Value};

use crate::clients::AwsClients;
use crate::config::{SimulateLowStockArgs, UploadArgs};

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Key used for an uploaded file when none is given explicitly.
pub fn upload_key(file: &Path, key: Option<&str>) -> Result<String, String> {
    if let Some(key) = key.map(str::trim).filter(|key| !key.is_empty()) {
        return Ok(key.to_string());
    }
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| format!("cannot derive an object key from {}", file.display()))
}

pub async fn upload_csv(
    clients: &AwsClients,
    names: &ResourceNames,
    args: &UploadArgs,
) -> Result<String, String> {
    let key = upload_key(&args.file, args.key.as_deref())?;
    let body = fs::read(&args.file)
        .map_err(|error| format!("failed to read {}: {error}", args.file.display()))?;

    clients
        .s3
        .put_object()
        .bucket(&names.uploads_bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .content_type(CSV_CONTENT_TYPE)
        .send()
        .await
        .map_err(|error| format!("failed to upload {key}: {error}"))?;

    Ok(format!("s3://{}/{key}", names.uploads_bucket))
}

/// The low stock item in DynamoDB's attribute-value JSON, as the `aws` CLI
/// expects it for `put-item --item`.
pub fn low_stock_item_json(store: &str, item: &str, count: i64) -> Value {
    json!({
        STORE_ATTRIBUTE: { "S": store },
        ITEM_ATTRIBUTE: { "S": item },
        COUNT_ATTRIBUTE: { "N": count.to_string() },
    })
}

pub fn low_stock_item(store: &str, item: &str, count: i64) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (STORE_ATTRIBUTE.to_string(), AttributeValue::S(store.to_string())),
        (ITEM_ATTRIBUTE.to_string(), AttributeValue::S(item.to_string())),
        (COUNT_ATTRIBUTE.to_string(), AttributeValue::N(count.to_string())),
    ])
}

/// Writes one item straight into the table so the stream fires the notifier.
pub async fn simulate_low_stock(
    clients: &AwsClients,
    names: &ResourceNames,
    args: &SimulateLowStockArgs,
) -> Result<Value, String> {
    clients
        .dynamodb
        .put_item()
        .table_name(&names.table)
        .set_item(Some(low_stock_item(&args.store, &args.item, args.count)))
        .send()
        .await
        .map_err(|error| format!("failed to write item to {}: {error}", names.table))?;

    Ok(low_stock_item_json(&args.store, &args.item, args.count))
}
