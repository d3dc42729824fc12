//! Decoding of the Lambda event payloads the pipeline reacts to.
//!
//! Events stay as `serde_json::Value` until they reach this module; only the
//! fields the handlers need are extracted.

use serde_json::Value;

use crate::contract::{ValidationError, COUNT_ATTRIBUTE, ITEM_ATTRIBUTE, STORE_ATTRIBUTE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3ObjectRef {
    pub bucket: String,
    pub key: String,
}

/// A stock level taken from the new image of a DynamoDB stream record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub store: String,
    pub item: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiRequest {
    pub method: String,
    pub store: Option<String>,
}

pub fn event_records(event: &Value) -> &[Value] {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn s3_object_refs(event: &Value) -> Result<Vec<S3ObjectRef>, ValidationError> {
    event_records(event)
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let bucket = record
                .pointer("/s3/bucket/name")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ValidationError::new(format!("S3 record {index} is missing s3.bucket.name"))
                })?;
            let key = record
                .pointer("/s3/object/key")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ValidationError::new(format!("S3 record {index} is missing s3.object.key"))
                })?;

            Ok(S3ObjectRef {
                bucket: bucket.to_string(),
                key: decode_object_key(key),
            })
        })
        .collect()
}

/// S3 notifications form-encode object keys (`+` for spaces).
pub fn decode_object_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

pub fn stock_changes(event: &Value) -> Vec<StockChange> {
    event_records(event)
        .iter()
        .filter_map(stock_change_from_record)
        .collect()
}

fn stock_change_from_record(record: &Value) -> Option<StockChange> {
    let event_name = record.get("eventName").and_then(Value::as_str)?;
    if !matches!(event_name, "INSERT" | "MODIFY") {
        return None;
    }

    let image = record.pointer("/dynamodb/NewImage")?;
    let store = typed_attribute(image, STORE_ATTRIBUTE, "S")?;
    let item = typed_attribute(image, ITEM_ATTRIBUTE, "S")?;
    let count = typed_attribute(image, COUNT_ATTRIBUTE, "N")?
        .trim()
        .parse::<i64>()
        .ok()?;

    Some(StockChange {
        store: store.to_string(),
        item: item.to_string(),
        count,
    })
}

fn typed_attribute<'v>(image: &'v Value, name: &str, type_tag: &str) -> Option<&'v str> {
    image.get(name)?.get(type_tag)?.as_str()
}

pub fn api_request(event: &Value) -> ApiRequest {
    let method = event
        .pointer("/requestContext/http/method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let store = event
        .pointer("/pathParameters/store")
        .and_then(Value::as_str)
        .filter(|store| !store.is_empty())
        .map(str::to_string);

    ApiRequest { method, store }
}
