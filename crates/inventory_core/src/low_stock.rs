use crate::contract::{LowStockAlert, LOW_STOCK_ALERT_TYPE};
use crate::events::StockChange;

/// SNS rejects subjects longer than this many characters.
pub const MAX_SUBJECT_CHARS: usize = 100;

pub fn evaluate(change: &StockChange, threshold: i64) -> Option<LowStockAlert> {
    if change.count > threshold {
        return None;
    }

    Some(LowStockAlert {
        alert_type: LOW_STOCK_ALERT_TYPE.to_string(),
        store: change.store.clone(),
        item: change.item.clone(),
        count: change.count,
        threshold,
    })
}

pub fn alert_subject(alert: &LowStockAlert) -> String {
    let subject = format!("Low stock: {} - {}", alert.store, alert.item);
    if subject.chars().count() <= MAX_SUBJECT_CHARS {
        return subject;
    }
    subject.chars().take(MAX_SUBJECT_CHARS).collect()
}

pub fn alert_message(alert: &LowStockAlert) -> Result<String, String> {
    serde_json::to_string(alert).map_err(|error| format!("failed to encode alert: {error}"))
}
