use inventory_lambda::adapters::aws::DynamoInventoryTable;
use inventory_lambda::config::TableConfig;
use inventory_lambda::handlers::inventory_api::{handle_api_event, ApiGatewayResponse};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(
    event: LambdaEvent<Value>,
    table: &DynamoInventoryTable,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_api_event(&event.payload, table))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = TableConfig::from_env().map_err(Error::from)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let table = DynamoInventoryTable::new(
        config.table_name,
        aws_sdk_dynamodb::Client::new(&aws_config),
    );
    let table = &table;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, table).await
    }))
    .await
}
