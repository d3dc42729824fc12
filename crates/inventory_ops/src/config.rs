use std::path::PathBuf;

use clap::Args;
use inventory_core::contract::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TABLE_NAME};
use inventory_core::naming::ResourceNames;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Settings shared by every subcommand. Each one falls back to the
/// environment (and therefore to `.env`).
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// AWS region to deploy into
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION, global = true)]
    pub region: String,
    /// Deployment suffix appended to every resource name
    #[arg(long, env = "SUFFIX", global = true)]
    pub suffix: Option<String>,
    /// DynamoDB table holding the inventory
    #[arg(long, env = "DDB_TABLE", default_value = DEFAULT_TABLE_NAME, global = true)]
    pub table: String,
}

impl CommonArgs {
    pub fn resource_names(&self) -> Result<ResourceNames, String> {
        let suffix = self
            .suffix
            .as_deref()
            .map(str::trim)
            .filter(|suffix| !suffix.is_empty())
            .ok_or_else(|| "SUFFIX must be configured".to_string())?;
        ResourceNames::for_suffix(suffix, &self.table).map_err(|error| error.to_string())
    }
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Existing IAM role assumed by the Lambda functions
    #[arg(long, env = "LAMBDA_ROLE_ARN")]
    pub lambda_role_arn: Option<String>,
    /// Email address subscribed to low stock alerts
    #[arg(long, env = "NOTIFY_EMAIL")]
    pub notify_email: Option<String>,
    /// Counts at or below this value raise an alert
    #[arg(
        long,
        env = "LOW_STOCK_THRESHOLD",
        default_value_t = DEFAULT_LOW_STOCK_THRESHOLD,
        allow_negative_numbers = true
    )]
    pub threshold: i64,
    /// Directory holding the packaged Lambda zips
    #[arg(long, default_value = "infra/dist")]
    pub artifacts_dir: PathBuf,
    /// Static site uploaded to the web bucket
    #[arg(long, default_value = "web")]
    pub web_dir: PathBuf,
}

/// Deploy settings after validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub role_arn: String,
    pub notify_email: Option<String>,
    pub threshold: i64,
    pub artifacts_dir: PathBuf,
    pub web_dir: PathBuf,
}

impl DeployArgs {
    pub fn settings(&self) -> Result<DeploySettings, String> {
        let role_arn = non_blank(self.lambda_role_arn.as_deref()).ok_or_else(|| {
            "LAMBDA_ROLE_ARN must be configured (use an existing role such as LabRole)".to_string()
        })?;

        Ok(DeploySettings {
            role_arn,
            notify_email: non_blank(self.notify_email.as_deref()),
            threshold: self.threshold,
            artifacts_dir: self.artifacts_dir.clone(),
            web_dir: self.web_dir.clone(),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// CSV file to upload
    #[arg(default_value = "inventario.csv")]
    pub file: PathBuf,
    /// Object key (defaults to the file name)
    #[arg(long)]
    pub key: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateLowStockArgs {
    #[arg(long, default_value = "Berlin")]
    pub store: String,
    #[arg(long, default_value = "StockPrueba")]
    pub item: String,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub count: i64,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(suffix: Option<&str>) -> CommonArgs {
        CommonArgs {
            region: DEFAULT_REGION.to_string(),
            suffix: suffix.map(str::to_string),
            table: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    fn deploy_args(role: Option<&str>, email: Option<&str>) -> DeployArgs {
        DeployArgs {
            lambda_role_arn: role.map(str::to_string),
            notify_email: email.map(str::to_string),
            threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            artifacts_dir: PathBuf::from("infra/dist"),
            web_dir: PathBuf::from("web"),
        }
    }

    #[test]
    fn suffix_is_required() {
        let error = common(None).resource_names().expect_err("missing suffix");
        assert_eq!(error, "SUFFIX must be configured");

        let error = common(Some("  ")).resource_names().expect_err("blank suffix");
        assert_eq!(error, "SUFFIX must be configured");
    }

    #[test]
    fn resource_names_use_suffix_and_table() {
        let names = common(Some("dev")).resource_names().expect("suffix is valid");
        assert_eq!(names.uploads_bucket, "inventory-uploads-dev");
        assert_eq!(names.table, "Inventory");
    }

    #[test]
    fn deploy_requires_role_and_ignores_blank_email() {
        let error = deploy_args(None, None).settings().expect_err("missing role");
        assert!(error.starts_with("LAMBDA_ROLE_ARN must be configured"));

        let settings = deploy_args(Some("arn:aws:iam::123456789012:role/LabRole"), Some(" "))
            .settings()
            .expect("role configured");
        assert_eq!(settings.notify_email, None);
        assert_eq!(settings.threshold, 2);
    }
}
