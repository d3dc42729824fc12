use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::adapters::table::InventoryReader;
use crate::logging::{log_error, log_info};
use crate::runtime::events::api_request;

const COMPONENT: &str = "inventory_api";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Serves `GET /items` and `GET /items/{store}` from an HTTP API (payload v2).
pub fn handle_api_event(event: &Value, reader: &impl InventoryReader) -> ApiGatewayResponse {
    let request = api_request(event);
    if request.method == "OPTIONS" {
        return json_response(200, &json!({"ok": true}));
    }

    let items = match request.store.as_deref() {
        Some(store) => reader.query_store(store),
        None => reader.scan_all(),
    };

    match items {
        Ok(items) => {
            log_info(
                COMPONENT,
                "items_listed",
                json!({
                    "store": request.store,
                    "items": items.len(),
                }),
            );
            json_response(200, &items)
        }
        Err(error) => {
            log_error(
                COMPONENT,
                "table_read_failed",
                json!({
                    "store": request.store,
                    "error": error.clone(),
                }),
            );
            json_response(
                500,
                &json!({
                    "error": "table_read_failed",
                    "message": error,
                }),
            )
        }
    }
}

fn json_response(status_code: u16, payload: &impl Serialize) -> ApiGatewayResponse {
    match serde_json::to_string(payload) {
        Ok(body) => ApiGatewayResponse {
            status_code,
            headers: response_headers(),
            body,
        },
        Err(error) => ApiGatewayResponse {
            status_code: 500,
            headers: response_headers(),
            body: json!({
                "error": "serialization_error",
                "message": error.to_string(),
            })
            .to_string(),
        },
    }
}

fn response_headers() -> Value {
    json!({
        "Content-Type": "application/json",
        "Access-Control-Allow-Origin": "*",
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::Number;

    use crate::runtime::contract::InventoryItemView;

    use super::*;

    struct FakeReader {
        items: Vec<InventoryItemView>,
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl FakeReader {
        fn new(items: Vec<InventoryItemView>) -> Self {
            Self {
                items,
                calls: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().expect("poisoned mutex").clone()
        }
    }

    impl InventoryReader for FakeReader {
        fn query_store(&self, store: &str) -> Result<Vec<InventoryItemView>, String> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(format!("query:{store}"));
            if self.fail {
                return Err("table unavailable".to_string());
            }
            Ok(self
                .items
                .iter()
                .filter(|item| item.store.as_deref() == Some(store))
                .cloned()
                .collect())
        }

        fn scan_all(&self) -> Result<Vec<InventoryItemView>, String> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push("scan".to_string());
            if self.fail {
                return Err("table unavailable".to_string());
            }
            Ok(self.items.clone())
        }
    }

    fn view(store: &str, item: &str, count: i64) -> InventoryItemView {
        InventoryItemView {
            store: Some(store.to_string()),
            item: Some(item.to_string()),
            count: Some(Number::from(count)),
        }
    }

    fn body_json(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be json")
    }

    #[test]
    fn options_preflight_short_circuits() {
        let reader = FakeReader::new(Vec::new());
        let response = handle_api_event(
            &json!({"requestContext": {"http": {"method": "OPTIONS"}}}),
            &reader,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(body_json(&response), json!({"ok": true}));
        assert!(reader.calls().is_empty());
    }

    #[test]
    fn lists_all_items_without_store() {
        let reader = FakeReader::new(vec![view("Berlin", "A", 1), view("Madrid", "B", 5)]);
        let response = handle_api_event(
            &json!({"requestContext": {"http": {"method": "GET"}}, "rawPath": "/items"}),
            &reader,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Access-Control-Allow-Origin"], Value::from("*"));
        assert_eq!(
            body_json(&response),
            json!([
                {"store": "Berlin", "item": "A", "count": 1},
                {"store": "Madrid", "item": "B", "count": 5}
            ])
        );
        assert_eq!(reader.calls(), vec!["scan".to_string()]);
    }

    #[test]
    fn queries_single_store_from_path() {
        let reader = FakeReader::new(vec![view("Berlin", "A", 1), view("Madrid", "B", 5)]);
        let response = handle_api_event(
            &json!({
                "requestContext": {"http": {"method": "GET"}},
                "pathParameters": {"store": "Madrid"}
            }),
            &reader,
        );

        assert_eq!(
            body_json(&response),
            json!([{"store": "Madrid", "item": "B", "count": 5}])
        );
        assert_eq!(reader.calls(), vec!["query:Madrid".to_string()]);
    }

    #[test]
    fn read_failure_maps_to_server_error() {
        let mut reader = FakeReader::new(Vec::new());
        reader.fail = true;
        let response = handle_api_event(
            &json!({"requestContext": {"http": {"method": "GET"}}}),
            &reader,
        );

        assert_eq!(response.status_code, 500);
        assert_eq!(body_json(&response)["error"], Value::from("table_read_failed"));
    }
}
