use inventory_lambda::adapters::aws::SnsAlertPublisher;
use inventory_lambda::config::NotifierConfig;
use inventory_lambda::handlers::notify_low_stock::handle_stream_event;
use inventory_lambda::runtime::contract::AlertSummary;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    threshold: i64,
    publisher: SnsAlertPublisher,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<AlertSummary, Error> {
    handle_stream_event(&event.payload, deps.threshold, &deps.publisher)
        .map_err(|error| Error::from(error.message))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = NotifierConfig::from_env().map_err(Error::from)?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = RuntimeDependencies {
        threshold: config.threshold,
        publisher: SnsAlertPublisher::new(config.topic_arn, aws_sdk_sns::Client::new(&aws_config)),
    };
    let deps = &deps;

    lambda_runtime::run(service_fn(move |event| async move {
        handle_request(event, deps).await
    }))
    .await
}
