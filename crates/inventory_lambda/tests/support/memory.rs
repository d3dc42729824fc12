#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use inventory_lambda::adapters::alerts::AlertPublisher;
use inventory_lambda::adapters::object_source::ObjectSource;
use inventory_lambda::adapters::table::{InventoryReader, InventoryWriter};
use inventory_lambda::runtime::contract::{InventoryItemView, InventoryRecord};
use serde_json::{json, Number, Value};

/// In-memory bucket keyed by `(bucket, key)`.
#[derive(Default)]
pub struct MemoryBucket {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryBucket {
    pub fn put(&self, bucket: &str, key: &str, body: &str) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), body.as_bytes().to_vec());
    }
}

impl ObjectSource for MemoryBucket {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| format!("NoSuchKey: s3://{bucket}/{key}"))
    }
}

/// In-memory table that mimics a DynamoDB stream with `NEW_IMAGE` records.
#[derive(Default)]
pub struct MemoryTable {
    items: Mutex<BTreeMap<(String, String), i64>>,
    stream: Mutex<Vec<Value>>,
}

impl MemoryTable {
    pub fn put(&self, record: &InventoryRecord) {
        let previous = self
            .items
            .lock()
            .expect("poisoned mutex")
            .insert((record.store.clone(), record.item.clone()), record.count);
        let event_name = if previous.is_some() { "MODIFY" } else { "INSERT" };

        self.stream.lock().expect("poisoned mutex").push(json!({
            "eventName": event_name,
            "eventSource": "aws:dynamodb",
            "dynamodb": {
                "Keys": {
                    "Store": {"S": record.store.clone()},
                    "Item": {"S": record.item.clone()}
                },
                "NewImage": {
                    "Store": {"S": record.store.clone()},
                    "Item": {"S": record.item.clone()},
                    "Count": {"N": record.count.to_string()}
                },
                "StreamViewType": "NEW_IMAGE"
            }
        }));
    }

    /// Drains pending stream records into one Lambda stream event.
    pub fn drain_stream_event(&self) -> Value {
        let records: Vec<Value> = self.stream.lock().expect("poisoned mutex").drain(..).collect();
        json!({ "Records": records })
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("poisoned mutex").len()
    }

    fn views(&self, store: Option<&str>) -> Vec<InventoryItemView> {
        self.items
            .lock()
            .expect("poisoned mutex")
            .iter()
            .filter(|((item_store, _), _)| store.is_none() || store == Some(item_store.as_str()))
            .map(|((item_store, item), count)| InventoryItemView {
                store: Some(item_store.clone()),
                item: Some(item.clone()),
                count: Some(Number::from(*count)),
            })
            .collect()
    }
}

impl InventoryWriter for MemoryTable {
    fn write_batch(&self, records: &[InventoryRecord]) -> Result<(), String> {
        if records.len() > 25 {
            return Err("ValidationException: too many items in batch".to_string());
        }
        records.iter().for_each(|record| self.put(record));
        Ok(())
    }
}

impl InventoryReader for MemoryTable {
    fn query_store(&self, store: &str) -> Result<Vec<InventoryItemView>, String> {
        Ok(self.views(Some(store)))
    }

    fn scan_all(&self) -> Result<Vec<InventoryItemView>, String> {
        Ok(self.views(None))
    }
}

#[derive(Default)]
pub struct CapturingTopic {
    messages: Mutex<Vec<(String, Value)>>,
}

impl CapturingTopic {
    pub fn messages(&self) -> Vec<(String, Value)> {
        self.messages.lock().expect("poisoned mutex").clone()
    }
}

impl AlertPublisher for CapturingTopic {
    fn publish(&self, subject: &str, message: &str) -> Result<(), String> {
        let message = serde_json::from_str(message).map_err(|error| error.to_string())?;
        self.messages
            .lock()
            .expect("poisoned mutex")
            .push((subject.to_string(), message));
        Ok(())
    }
}

pub fn object_created_event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": {"name": bucket},
                "object": {"key": key}
            }
        }]
    })
}

pub fn http_get(path_store: Option<&str>) -> Value {
    let path_parameters = path_store.map(|store| json!({ "store": store }));
    json!({
        "version": "2.0",
        "requestContext": {"http": {"method": "GET"}},
        "pathParameters": path_parameters
    })
}
