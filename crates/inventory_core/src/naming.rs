use crate::contract::ValidationError;

/// S3 bucket names are limited to 63 characters.
pub const MAX_BUCKET_NAME_LEN: usize = 63;

const UPLOADS_BUCKET_PREFIX: &str = "inventory-uploads-";
const WEB_BUCKET_PREFIX: &str = "inventory-web-";

/// Names of every AWS resource owned by one deployment suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub suffix: String,
    pub table: String,
    pub uploads_bucket: String,
    pub web_bucket: String,
    pub load_function: String,
    pub api_function: String,
    pub notify_function: String,
    pub api: String,
    pub topic: String,
}

impl ResourceNames {
    pub fn for_suffix(suffix: &str, table: &str) -> Result<Self, ValidationError> {
        validate_suffix(suffix)?;

        let table = table.trim();
        if table.is_empty() {
            return Err(ValidationError::new("table name cannot be empty"));
        }

        Ok(Self {
            suffix: suffix.to_string(),
            table: table.to_string(),
            uploads_bucket: format!("{UPLOADS_BUCKET_PREFIX}{suffix}"),
            web_bucket: format!("{WEB_BUCKET_PREFIX}{suffix}"),
            load_function: format!("load_inventory_{suffix}"),
            api_function: format!("get_inventory_api_{suffix}"),
            notify_function: format!("notify_low_stock_{suffix}"),
            api: format!("inventory-api-{suffix}"),
            topic: format!("inventory-low-stock-{suffix}"),
        })
    }

    pub fn functions(&self) -> [&str; 3] {
        [
            self.load_function.as_str(),
            self.api_function.as_str(),
            self.notify_function.as_str(),
        ]
    }

    pub fn buckets(&self) -> [&str; 2] {
        [self.uploads_bucket.as_str(), self.web_bucket.as_str()]
    }

    /// Whether `topic_arn` names this deployment's alert topic.
    pub fn matches_topic_arn(&self, topic_arn: &str) -> bool {
        topic_arn.ends_with(&format!(":{}", self.topic))
    }
}

pub fn validate_suffix(suffix: &str) -> Result<(), ValidationError> {
    if suffix.is_empty() {
        return Err(ValidationError::new("SUFFIX cannot be empty"));
    }

    if let Some(invalid) = suffix
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(ValidationError::new(format!(
            "SUFFIX may only contain lowercase letters, digits and '-' (found '{invalid}')"
        )));
    }

    if suffix.starts_with('-') || suffix.ends_with('-') {
        return Err(ValidationError::new("SUFFIX cannot start or end with '-'"));
    }

    let longest_bucket = UPLOADS_BUCKET_PREFIX.len() + suffix.len();
    if longest_bucket > MAX_BUCKET_NAME_LEN {
        return Err(ValidationError::new(format!(
            "SUFFIX is too long: bucket names are limited to {MAX_BUCKET_NAME_LEN} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_all_resource_names_from_suffix() {
        let names = ResourceNames::for_suffix("ana-01", "Inventory").expect("suffix is valid");

        assert_eq!(names.uploads_bucket, "inventory-uploads-ana-01");
        assert_eq!(names.web_bucket, "inventory-web-ana-01");
        assert_eq!(
            names.functions(),
            [
                "load_inventory_ana-01",
                "get_inventory_api_ana-01",
                "notify_low_stock_ana-01"
            ]
        );
        assert_eq!(names.api, "inventory-api-ana-01");
        assert_eq!(names.topic, "inventory-low-stock-ana-01");
        assert_eq!(names.table, "Inventory");
    }

    #[test]
    fn rejects_suffixes_that_break_bucket_names() {
        for suffix in ["", "Ana", "ana_01", "-ana", "ana-", "ana.01"] {
            assert!(
                ResourceNames::for_suffix(suffix, "Inventory").is_err(),
                "suffix {suffix:?} should be rejected"
            );
        }

        let too_long = "a".repeat(MAX_BUCKET_NAME_LEN);
        let error = validate_suffix(&too_long).expect_err("long suffix should fail");
        assert!(error.message().contains("too long"));
    }

    #[test]
    fn matches_topic_arn_by_name_segment() {
        let names = ResourceNames::for_suffix("dev", "Inventory").expect("suffix is valid");

        let arn = |topic: &str| format!("arn:aws:sns:us-east-1:123456789012:{topic}");

        assert!(names.matches_topic_arn(&arn("inventory-low-stock-dev")));
        assert!(!names.matches_topic_arn(&arn("other-inventory-low-stock-dev-2")));
        assert!(!names.matches_topic_arn(&arn("xinventory-low-stock-dev")));
    }
}
