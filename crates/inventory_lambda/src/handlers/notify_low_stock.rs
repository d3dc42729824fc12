use serde_json::{json, Value};

use crate::adapters::alerts::AlertPublisher;
use crate::handlers::HandlerError;
use crate::logging::{log_error, log_info};
use crate::runtime::contract::AlertSummary;
use crate::runtime::events::stock_changes;
use crate::runtime::low_stock::{alert_message, alert_subject, evaluate};

const COMPONENT: &str = "notify_low_stock";

/// Publishes one alert per inserted or modified item whose count is at or
/// below `threshold`. A publish failure fails the batch so the stream
/// mapping retries it.
pub fn handle_stream_event(
    event: &Value,
    threshold: i64,
    publisher: &impl AlertPublisher,
) -> Result<AlertSummary, HandlerError> {
    let mut alerts_sent = 0usize;

    for change in stock_changes(event) {
        let Some(alert) = evaluate(&change, threshold) else {
            continue;
        };

        let subject = alert_subject(&alert);
        let message = alert_message(&alert).map_err(HandlerError::new)?;
        if let Err(error) = publisher.publish(&subject, &message) {
            log_error(
                COMPONENT,
                "alert_failed",
                json!({
                    "store": alert.store,
                    "item": alert.item,
                    "error": error.clone(),
                }),
            );
            return Err(HandlerError::new(error));
        }

        log_info(
            COMPONENT,
            "alert_sent",
            json!({
                "store": alert.store,
                "item": alert.item,
                "count": alert.count,
                "threshold": threshold,
            }),
        );
        alerts_sent += 1;
    }

    Ok(AlertSummary::sent(alerts_sent))
}
