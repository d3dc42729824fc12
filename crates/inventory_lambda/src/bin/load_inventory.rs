use inventory_lambda::adapters::aws::{DynamoInventoryTable, S3ObjectSource};
use inventory_lambda::config::TableConfig;
use inventory_lambda::handlers::load_inventory::handle_load_event;
use inventory_lambda::runtime::contract::LoadSummary;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    source: S3ObjectSource,
    table: DynamoInventoryTable,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<LoadSummary, Error> {
    handle_load_event(&event.payload, &deps.source, &deps.table)
        .map_err(|error| Error::from(error.message))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = TableConfig::from_env().map_err(Error::from)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        source: S3ObjectSource::new(aws_sdk_s3::Client::new(&aws_config)),
        table: DynamoInventoryTable::new(
            config.table_name,
            aws_sdk_dynamodb::Client::new(&aws_config),
        ),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, deps).await
    }))
    .await
}
