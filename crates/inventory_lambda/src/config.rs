//! Environment configuration for the Lambda binaries.

use crate::runtime::contract::DEFAULT_LOW_STOCK_THRESHOLD;

pub const TABLE_NAME_VAR: &str = "TABLE_NAME";
pub const TOPIC_ARN_VAR: &str = "TOPIC_ARN";
pub const THRESHOLD_VAR: &str = "THRESHOLD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
}

impl TableConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        Ok(Self {
            table_name: required(&lookup, TABLE_NAME_VAR)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub topic_arn: String,
    pub threshold: i64,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let topic_arn = required(&lookup, TOPIC_ARN_VAR)?;
        let threshold = match lookup(THRESHOLD_VAR) {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("{THRESHOLD_VAR} must be an integer (got '{raw}')"))?,
            _ => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        Ok(Self {
            topic_arn,
            threshold,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, String> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| format!("{name} must be configured"))
}
