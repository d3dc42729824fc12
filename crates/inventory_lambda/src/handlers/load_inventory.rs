use std::time::Instant;

use serde_json::{json, Value};

use crate::adapters::object_source::ObjectSource;
use crate::adapters::table::InventoryWriter;
use crate::handlers::HandlerError;
use crate::logging::{log_error, log_info};
use crate::runtime::contract::LoadSummary;
use crate::runtime::csv_import::{dedupe_by_key, parse_inventory_csv, write_batches};
use crate::runtime::events::{event_records, s3_object_refs, S3ObjectRef};

const COMPONENT: &str = "load_inventory";

/// Loads every CSV object referenced by an S3 notification into the table.
///
/// The reported total counts accepted rows, including rows that a later row
/// of the same file overwrote. Any read or write failure fails the whole
/// invocation so the S3 trigger retries it.
pub fn handle_load_event(
    event: &Value,
    source: &impl ObjectSource,
    writer: &impl InventoryWriter,
) -> Result<LoadSummary, HandlerError> {
    if event_records(event).is_empty() {
        log_info(COMPONENT, "no_records", json!({}));
        return Ok(LoadSummary::no_records());
    }

    let objects = s3_object_refs(event).map_err(|error| {
        log_error(COMPONENT, "invalid_event", json!({ "error": error.message() }));
        HandlerError::new(format!("invalid S3 event: {error}"))
    })?;

    let mut total_written = 0usize;
    for object in &objects {
        let started_at = Instant::now();
        match load_object(object, source, writer) {
            Ok(stats) => {
                log_info(
                    COMPONENT,
                    "object_loaded",
                    json!({
                        "bucket": object.bucket.clone(),
                        "key": object.key.clone(),
                        "rows_written": stats.rows_written,
                        "unique_items": stats.unique_items,
                        "rows_skipped": stats.rows_skipped,
                        "duration_ms": started_at.elapsed().as_millis(),
                    }),
                );
                total_written += stats.rows_written;
            }
            Err(error) => {
                log_error(
                    COMPONENT,
                    "object_failed",
                    json!({
                        "bucket": object.bucket.clone(),
                        "key": object.key.clone(),
                        "duration_ms": started_at.elapsed().as_millis(),
                        "error": error.message.clone(),
                    }),
                );
                return Err(error);
            }
        }
    }

    Ok(LoadSummary::written(total_written))
}

struct ObjectLoadStats {
    rows_written: usize,
    unique_items: usize,
    rows_skipped: usize,
}

fn load_object(
    object: &S3ObjectRef,
    source: &impl ObjectSource,
    writer: &impl InventoryWriter,
) -> Result<ObjectLoadStats, HandlerError> {
    let body = source
        .read_object(&object.bucket, &object.key)
        .map_err(HandlerError::new)?;

    let import = parse_inventory_csv(&body).map_err(|error| {
        HandlerError::new(format!(
            "failed to parse s3://{}/{}: {error}",
            object.bucket, object.key
        ))
    })?;

    let rows_written = import.records.len();
    let rows_skipped = import.skipped;
    let unique = dedupe_by_key(import.records);

    for batch in write_batches(&unique) {
        writer.write_batch(batch).map_err(|error| {
            HandlerError::new(format!("failed to write inventory batch: {error}"))
        })?;
    }

    Ok(ObjectLoadStats {
        rows_written,
        unique_items: unique.len(),
        rows_skipped,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::runtime::contract::InventoryRecord;

    use super::*;

    struct MemoryObjects {
        objects: HashMap<(String, String), Vec<u8>>,
    }

    impl MemoryObjects {
        fn with(bucket: &str, key: &str, body: &str) -> Self {
            Self {
                objects: HashMap::from([(
                    (bucket.to_string(), key.to_string()),
                    body.as_bytes().to_vec(),
                )]),
            }
        }
    }

    impl ObjectSource for MemoryObjects {
        fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
            self.objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| format!("no such object s3://{bucket}/{key}"))
        }
    }

    struct CapturingWriter {
        batches: Mutex<Vec<Vec<InventoryRecord>>>,
        fail: bool,
    }

    impl CapturingWriter {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn batches(&self) -> Vec<Vec<InventoryRecord>> {
            self.batches.lock().expect("poisoned mutex").clone()
        }
    }

    impl InventoryWriter for CapturingWriter {
        fn write_batch(&self, records: &[InventoryRecord]) -> Result<(), String> {
            if self.fail {
                return Err("throttled".to_string());
            }
            self.batches
                .lock()
                .expect("poisoned mutex")
                .push(records.to_vec());
            Ok(())
        }
    }

    fn upload_event(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [
                {"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}
            ]
        })
    }

    #[test]
    fn reports_no_records_without_touching_storage() {
        let source = MemoryObjects::with("b", "k", "");
        let writer = CapturingWriter::new();

        let summary = handle_load_event(&json!({"Records": []}), &source, &writer)
            .expect("empty event should succeed");

        assert_eq!(summary, LoadSummary::no_records());
        assert!(writer.batches().is_empty());
    }

    #[test]
    fn writes_parsed_rows_and_counts_accepted_rows() {
        let source = MemoryObjects::with(
            "inventory-uploads-dev",
            "inventario.csv",
            "store,item,count\nBerlin,Tornillos,10\nBerlin,Tornillos,4\n,Sin tienda,1\nMadrid,Tuercas,x\n",
        );
        let writer = CapturingWriter::new();

        let summary = handle_load_event(
            &upload_event("inventory-uploads-dev", "inventario.csv"),
            &source,
            &writer,
        )
        .expect("load should succeed");

        assert_eq!(summary, LoadSummary::written(3));
        assert_eq!(
            writer.batches(),
            vec![vec![
                InventoryRecord::new("Berlin", "Tornillos", 4),
                InventoryRecord::new("Madrid", "Tuercas", 0),
            ]]
        );
    }

    #[test]
    fn splits_large_files_into_dynamodb_batches() {
        let mut body = String::from("store,item,count\n");
        for index in 0..30 {
            body.push_str(&format!("Berlin,item-{index},{index}\n"));
        }
        let source = MemoryObjects::with("b", "big.csv", &body);
        let writer = CapturingWriter::new();

        let summary = handle_load_event(&upload_event("b", "big.csv"), &source, &writer)
            .expect("load should succeed");

        assert_eq!(summary, LoadSummary::written(30));
        let sizes: Vec<usize> = writer.batches().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 5]);
    }

    #[test]
    fn missing_object_fails_the_invocation() {
        let source = MemoryObjects::with("b", "other.csv", "store,item,count\n");
        let writer = CapturingWriter::new();

        let error = handle_load_event(&upload_event("b", "inventario.csv"), &source, &writer)
            .expect_err("missing object should fail");

        assert!(error.message.contains("no such object s3://b/inventario.csv"));
    }

    #[test]
    fn write_failure_fails_the_invocation() {
        let source = MemoryObjects::with("b", "k.csv", "store,item,count\nBerlin,A,1\n");
        let writer = CapturingWriter::failing();

        let error = handle_load_event(&upload_event("b", "k.csv"), &source, &writer)
            .expect_err("write failure should fail");

        assert_eq!(error.message, "failed to write inventory batch: throttled");
    }
}
