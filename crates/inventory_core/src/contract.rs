use serde::{Deserialize, Serialize};
use serde_json::Number;

pub const DEFAULT_TABLE_NAME: &str = "Inventory";
pub const STORE_ATTRIBUTE: &str = "Store";
pub const ITEM_ATTRIBUTE: &str = "Item";
pub const COUNT_ATTRIBUTE: &str = "Count";
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 2;
pub const LOW_STOCK_ALERT_TYPE: &str = "LOW_STOCK";

/// A single inventory row keyed by `(Store, Item)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryRecord {
    pub store: String,
    pub item: String,
    pub count: i64,
}

impl InventoryRecord {
    pub fn new(store: impl Into<String>, item: impl Into<String>, count: i64) -> Self {
        Self {
            store: store.into(),
            item: item.into(),
            count,
        }
    }

    pub fn key(&self) -> (&str, &str) {
        (&self.store, &self.item)
    }
}

/// Item shape returned by the inventory HTTP API.
///
/// Attributes missing from the stored item are reported as `null` rather
/// than dropped, so clients always see the same three keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItemView {
    pub store: Option<String>,
    pub item: Option<String>,
    pub count: Option<Number>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadSummary {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl LoadSummary {
    pub fn no_records() -> Self {
        Self {
            ok: true,
            written: None,
            msg: Some("no records".to_string()),
        }
    }

    pub fn written(total: usize) -> Self {
        Self {
            ok: true,
            written: Some(total),
            msg: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertSummary {
    pub ok: bool,
    pub alerts_sent: usize,
}

impl AlertSummary {
    pub fn sent(alerts_sent: usize) -> Self {
        Self {
            ok: true,
            alerts_sent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LowStockAlert {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub store: String,
    pub item: String,
    pub count: i64,
    pub threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Converts a DynamoDB `N` attribute into a JSON number.
///
/// Integral values come back as integers even when stored with a fractional
/// part of zero (`"5.0"`), exact across the whole `i64` and `u64` range.
/// Integers beyond `u64` and non-integral values become the nearest `f64`.
pub fn count_from_attribute(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(Number::from(value));
    }
    if let Ok(value) = trimmed.parse::<u64>() {
        return Some(Number::from(value));
    }

    let value = trimmed.parse::<f64>().ok().filter(|value| value.is_finite())?;
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return Some(Number::from(value as i64));
    }
    if value.fract() == 0.0 && value >= 0.0 && value < u64::MAX as f64 {
        return Some(Number::from(value as u64));
    }
    Number::from_f64(value)
}
