//! Idempotent provisioning of the inventory pipeline.
//!
//! Every `ensure_*` step looks the resource up first and only creates or
//! updates what is missing, so `deploy` can be re-run after a partial failure
//! or to ship new Lambda code.

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use aws_sdk_apigatewayv2::types::{Cors, IntegrationType, ProtocolType};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    StreamSpecification, StreamViewType, TableDescription, TableStatus,
};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, EventSourcePosition, FunctionCode, Runtime};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Event, FilterRule, FilterRuleName,
    LambdaFunctionConfiguration, NotificationConfiguration, NotificationConfigurationFilter,
    S3KeyFilter,
};
use inventory_core::contract::{ITEM_ATTRIBUTE, STORE_ATTRIBUTE};
use inventory_core::naming::ResourceNames;

use crate::clients::AwsClients;
use crate::config::{DeploySettings, DEFAULT_REGION};
use crate::retry::{
    call_with_retries, is_transient_sdk_error, wait_until, Readiness, RetryPolicy,
};
use crate::sdk::{flag, has_code, is_missing_resource, text};
use crate::step;
use crate::web::{collect_web_assets, INDEX_PAGE as INDEX_KEY};

pub const LAMBDA_RUNTIME: &str = "provided.al2023";
pub const LAMBDA_HANDLER: &str = "bootstrap";
pub const LAMBDA_TIMEOUT_SECS: i32 = 30;
pub const LAMBDA_MEMORY_MB: i32 = 256;
pub const LOAD_INVENTORY_ARTIFACT: &str = "load_inventory.zip";
pub const INVENTORY_API_ARTIFACT: &str = "get_inventory_api.zip";
pub const NOTIFY_LOW_STOCK_ARTIFACT: &str = "notify_low_stock.zip";
pub const API_ROUTES: [&str; 2] = ["GET /items", "GET /items/{store}"];
pub const DEFAULT_STAGE: &str = "$default";
pub const CSV_SUFFIX_FILTER: &str = ".csv";

const LAMBDA_READY_TIMEOUT: Duration = Duration::from_secs(120);
const TABLE_ACTIVE_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Everything the operator needs after a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutputs {
    pub uploads_bucket: String,
    pub web_bucket: String,
    pub table: String,
    pub stream_arn: String,
    pub topic_arn: String,
    pub mapping_uuid: String,
    pub api_endpoint: String,
    pub web_url: String,
    pub email_subscribed: bool,
}

pub async fn run_deploy(
    clients: &AwsClients,
    names: &ResourceNames,
    settings: &DeploySettings,
) -> Result<DeployOutputs, String> {
    let account_id = clients.account_id().await?;
    eprintln!("Region:      {}", clients.region);
    eprintln!("Suffix:      {}", names.suffix);
    eprintln!("Account:     {account_id}");
    eprintln!("Lambda role: {}", settings.role_arn);

    step("Buckets");
    for bucket in names.buckets() {
        ensure_bucket(&clients.s3, bucket, &clients.region).await?;
    }

    step("DynamoDB table");
    let stream_arn = ensure_table_with_stream(&clients.dynamodb, &names.table).await?;

    step("Lambda artifacts");
    let load_zip = read_artifact(settings, LOAD_INVENTORY_ARTIFACT)?;
    let api_zip = read_artifact(settings, INVENTORY_API_ARTIFACT)?;
    let notify_zip = read_artifact(settings, NOTIFY_LOW_STOCK_ARTIFACT)?;

    step("Lambda functions");
    let table_env = HashMap::from([("TABLE_NAME".to_string(), names.table.clone())]);
    let load_arn = ensure_lambda(
        &clients.lambda,
        &FunctionDefinition {
            name: &names.load_function,
            role_arn: &settings.role_arn,
            zip: &load_zip,
            environment: table_env.clone(),
        },
    )
    .await?;
    let api_arn = ensure_lambda(
        &clients.lambda,
        &FunctionDefinition {
            name: &names.api_function,
            role_arn: &settings.role_arn,
            zip: &api_zip,
            environment: table_env,
        },
    )
    .await?;

    step("SNS topic");
    let topic_arn =
        ensure_topic_and_subscription(&clients.sns, &names.topic, settings.notify_email.as_deref())
            .await?;

    let notify_arn = ensure_lambda(
        &clients.lambda,
        &FunctionDefinition {
            name: &names.notify_function,
            role_arn: &settings.role_arn,
            zip: &notify_zip,
            environment: HashMap::from([
                ("TOPIC_ARN".to_string(), topic_arn.clone()),
                ("THRESHOLD".to_string(), settings.threshold.to_string()),
            ]),
        },
    )
    .await?;

    step("S3 trigger");
    ensure_s3_trigger(clients, &names.uploads_bucket, &load_arn).await?;

    step("HTTP API");
    let api_endpoint = ensure_http_api(clients, &names.api, &api_arn, &account_id).await?;

    step("Stream mapping");
    let mapping_uuid = ensure_event_source_mapping(clients, &notify_arn, &stream_arn).await?;

    step("Web assets");
    upload_web_dir(&clients.s3, &names.web_bucket, settings).await?;
    let index_url = presign_index(&clients.s3, &names.web_bucket).await?;

    Ok(DeployOutputs {
        uploads_bucket: names.uploads_bucket.clone(),
        web_bucket: names.web_bucket.clone(),
        table: names.table.clone(),
        stream_arn,
        topic_arn,
        mapping_uuid,
        web_url: web_url_with_api(&index_url, &api_endpoint),
        api_endpoint,
        email_subscribed: settings.notify_email.is_some(),
    })
}

pub fn bucket_location(region: &str) -> Option<&str> {
    (region != DEFAULT_REGION).then_some(region)
}

async fn ensure_bucket(s3: &aws_sdk_s3::Client, bucket: &str, region: &str) -> Result<(), String> {
    if s3.head_bucket().bucket(bucket).send().await.is_ok() {
        eprintln!("Bucket exists: {bucket}");
        return Ok(());
    }

    let mut request = s3.create_bucket().bucket(bucket);
    if let Some(location) = bucket_location(region) {
        request = request.create_bucket_configuration(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(location))
                .build(),
        );
    }

    request
        .send()
        .await
        .map_err(|error| format!("failed to create bucket {bucket}: {error}"))?;
    eprintln!("Created bucket: {bucket}");
    Ok(())
}

fn new_image_stream() -> Result<StreamSpecification, String> {
    StreamSpecification::builder()
        .stream_enabled(true)
        .stream_view_type(StreamViewType::NewImage)
        .build()
        .map_err(|error| format!("failed to build stream specification: {error}"))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition, String> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|error| format!("failed to build attribute {name}: {error}"))
}

fn key_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, String> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|error| format!("failed to build key {name}: {error}"))
}

fn stream_enabled(table: &TableDescription) -> bool {
    table
        .stream_specification()
        .map(|stream| flag(stream.stream_enabled()))
        .unwrap_or(false)
}

async fn describe_table(
    ddb: &aws_sdk_dynamodb::Client,
    table: &str,
) -> Result<Option<TableDescription>, String> {
    match ddb.describe_table().table_name(table).send().await {
        Ok(output) => Ok(output.table().cloned()),
        Err(error) if is_missing_resource(&error) => Ok(None),
        Err(error) => Err(format!("failed to describe table {table}: {error}")),
    }
}

async fn wait_table_active(
    ddb: &aws_sdk_dynamodb::Client,
    table: &str,
) -> Result<TableDescription, String> {
    wait_until(
        &format!("Table {table}"),
        TABLE_ACTIVE_TIMEOUT,
        POLL_INTERVAL,
        || async move {
            let description = describe_table(ddb, table).await?;
            Ok(match description.as_ref().and_then(TableDescription::table_status) {
                Some(TableStatus::Active) => Readiness::Ready,
                Some(status) => Readiness::Pending(format!("TableStatus={}", status.as_str())),
                None => Readiness::Pending("TableStatus=Unknown".to_string()),
            })
        },
    )
    .await?;

    describe_table(ddb, table)
        .await?
        .ok_or_else(|| format!("table {table} disappeared while waiting for it"))
}

async fn ensure_table_with_stream(
    ddb: &aws_sdk_dynamodb::Client,
    table: &str,
) -> Result<String, String> {
    let mut description = match describe_table(ddb, table).await? {
        Some(description) => description,
        None => {
            ddb.create_table()
                .table_name(table)
                .billing_mode(BillingMode::PayPerRequest)
                .attribute_definitions(string_attribute(STORE_ATTRIBUTE)?)
                .attribute_definitions(string_attribute(ITEM_ATTRIBUTE)?)
                .key_schema(key_element(STORE_ATTRIBUTE, KeyType::Hash)?)
                .key_schema(key_element(ITEM_ATTRIBUTE, KeyType::Range)?)
                .stream_specification(new_image_stream()?)
                .send()
                .await
                .map_err(|error| format!("failed to create table {table}: {error}"))?;
            eprintln!("Created table: {table}");
            wait_table_active(ddb, table).await?
        }
    };

    if !stream_enabled(&description) {
        ddb.update_table()
            .table_name(table)
            .stream_specification(new_image_stream()?)
            .send()
            .await
            .map_err(|error| format!("failed to enable stream on {table}: {error}"))?;
        eprintln!("Enabled stream on table: {table}");
        description = wait_table_active(ddb, table).await?;
    }

    description
        .latest_stream_arn()
        .map(str::to_string)
        .ok_or_else(|| format!("no stream ARN available for table {table} (streams disabled?)"))
}

fn read_artifact(settings: &DeploySettings, file_name: &str) -> Result<Vec<u8>, String> {
    let path = settings.artifacts_dir.join(file_name);
    fs::read(&path).map_err(|error| {
        format!(
            "failed to read lambda artifact {} ({error}); run `cargo run -p xtask -- lambda-package` first",
            path.display()
        )
    })
}

pub struct FunctionDefinition<'a> {
    pub name: &'a str,
    pub role_arn: &'a str,
    pub zip: &'a [u8],
    pub environment: HashMap<String, String>,
}

/// Maps Lambda's `State` / `LastUpdateStatus` pair onto a readiness check.
pub fn lambda_readiness(state: Option<&str>, last_update_status: Option<&str>) -> Readiness {
    let state = state.unwrap_or("Unknown");
    let last_update_status = last_update_status.unwrap_or("Unknown");
    let status = format!("State={state}, LastUpdateStatus={last_update_status}");

    if state == "Failed" || last_update_status == "Failed" {
        return Readiness::Failed(status);
    }
    if state == "Active" && matches!(last_update_status, "Successful" | "Unknown") {
        return Readiness::Ready;
    }
    Readiness::Pending(status)
}

async fn wait_lambda_ready(lambda: &aws_sdk_lambda::Client, name: &str) -> Result<(), String> {
    wait_until(
        &format!("Lambda {name}"),
        LAMBDA_READY_TIMEOUT,
        POLL_INTERVAL,
        || async move {
            let config = lambda
                .get_function_configuration()
                .function_name(name)
                .send()
                .await
                .map_err(|error| format!("failed to read configuration of {name}: {error}"))?;
            Ok(lambda_readiness(
                config.state().map(|state| state.as_str()),
                config.last_update_status().map(|status| status.as_str()),
            ))
        },
    )
    .await
}

fn function_environment(function: &FunctionDefinition<'_>) -> Environment {
    Environment::builder()
        .set_variables(Some(function.environment.clone()))
        .build()
}

async fn ensure_lambda(
    lambda: &aws_sdk_lambda::Client,
    function: &FunctionDefinition<'_>,
) -> Result<String, String> {
    match lambda.get_function().function_name(function.name).send().await {
        Ok(_) => update_lambda(lambda, function).await,
        Err(error) if is_missing_resource(&error) => create_lambda(lambda, function).await,
        Err(error) => Err(format!("failed to look up function {}: {error}", function.name)),
    }
}

async fn update_lambda(
    lambda: &aws_sdk_lambda::Client,
    function: &FunctionDefinition<'_>,
) -> Result<String, String> {
    wait_lambda_ready(lambda, function.name).await?;

    call_with_retries(RetryPolicy::LAMBDA_MUTATION, is_transient_sdk_error, || {
        lambda
            .update_function_code()
            .function_name(function.name)
            .zip_file(Blob::new(function.zip.to_vec()))
            .publish(true)
            .send()
    })
    .await
    .map_err(|error| format!("failed to update code of {}: {error}", function.name))?;
    wait_lambda_ready(lambda, function.name).await?;

    call_with_retries(RetryPolicy::LAMBDA_MUTATION, is_transient_sdk_error, || {
        lambda
            .update_function_configuration()
            .function_name(function.name)
            .role(function.role_arn)
            .handler(LAMBDA_HANDLER)
            .runtime(Runtime::from(LAMBDA_RUNTIME))
            .timeout(LAMBDA_TIMEOUT_SECS)
            .memory_size(LAMBDA_MEMORY_MB)
            .environment(function_environment(function))
            .send()
    })
    .await
    .map_err(|error| format!("failed to update configuration of {}: {error}", function.name))?;
    wait_lambda_ready(lambda, function.name).await?;

    let output = lambda
        .get_function()
        .function_name(function.name)
        .send()
        .await
        .map_err(|error| format!("failed to read function {}: {error}", function.name))?;
    eprintln!("Updated Lambda: {}", function.name);
    output
        .configuration()
        .and_then(|configuration| configuration.function_arn())
        .map(str::to_string)
        .ok_or_else(|| format!("function {} has no ARN", function.name))
}

async fn create_lambda(
    lambda: &aws_sdk_lambda::Client,
    function: &FunctionDefinition<'_>,
) -> Result<String, String> {
    let output = call_with_retries(RetryPolicy::LAMBDA_MUTATION, is_transient_sdk_error, || {
        lambda
            .create_function()
            .function_name(function.name)
            .role(function.role_arn)
            .runtime(Runtime::from(LAMBDA_RUNTIME))
            .handler(LAMBDA_HANDLER)
            .code(
                FunctionCode::builder()
                    .zip_file(Blob::new(function.zip.to_vec()))
                    .build(),
            )
            .timeout(LAMBDA_TIMEOUT_SECS)
            .memory_size(LAMBDA_MEMORY_MB)
            .publish(true)
            .environment(function_environment(function))
            .send()
    })
    .await
    .map_err(|error| format!("failed to create function {}: {error}", function.name))?;

    wait_lambda_ready(lambda, function.name).await?;
    eprintln!("Created Lambda: {}", function.name);
    output
        .function_arn()
        .map(str::to_string)
        .ok_or_else(|| format!("function {} has no ARN", function.name))
}

async fn add_invoke_permission(
    lambda: &aws_sdk_lambda::Client,
    function_arn: &str,
    statement_id: &str,
    principal: &str,
    source_arn: &str,
) -> Result<(), String> {
    match lambda
        .add_permission()
        .function_name(function_arn)
        .statement_id(statement_id)
        .action("lambda:InvokeFunction")
        .principal(principal)
        .source_arn(source_arn)
        .send()
        .await
    {
        Ok(_) => Ok(()),
        Err(error) if has_code(&error, "ResourceConflictException") => Ok(()),
        Err(error) => Err(format!(
            "failed to grant {principal} invoke on {function_arn}: {error}"
        )),
    }
}

async fn ensure_s3_trigger(
    clients: &AwsClients,
    bucket: &str,
    function_arn: &str,
) -> Result<(), String> {
    add_invoke_permission(
        &clients.lambda,
        function_arn,
        &format!("s3invoke-{bucket}"),
        "s3.amazonaws.com",
        &format!("arn:aws:s3:::{bucket}"),
    )
    .await?;

    let trigger = LambdaFunctionConfiguration::builder()
        .lambda_function_arn(function_arn)
        .events(Event::from("s3:ObjectCreated:*"))
        .filter(
            NotificationConfigurationFilter::builder()
                .key(
                    S3KeyFilter::builder()
                        .filter_rules(
                            FilterRule::builder()
                                .name(FilterRuleName::Suffix)
                                .value(CSV_SUFFIX_FILTER)
                                .build(),
                        )
                        .build(),
                )
                .build(),
        )
        .build()
        .map_err(|error| format!("failed to build bucket notification: {error}"))?;
    let notification = NotificationConfiguration::builder()
        .lambda_function_configurations(trigger)
        .build();

    // S3 validates the destination, which can lag behind the new permission.
    call_with_retries(
        RetryPolicy::LAMBDA_MUTATION,
        |error: &_| has_code(error, "InvalidArgument") || is_transient_sdk_error(error),
        || {
            clients
                .s3
                .put_bucket_notification_configuration()
                .bucket(bucket)
                .notification_configuration(notification.clone())
                .send()
        },
    )
    .await
    .map_err(|error| format!("failed to configure notifications on {bucket}: {error}"))?;
    eprintln!("S3 trigger: {bucket} (*{CSV_SUFFIX_FILTER}) -> {function_arn}");
    Ok(())
}

pub fn execute_api_source_arn(region: &str, account_id: &str, api_id: &str) -> String {
    format!("arn:aws:execute-api:{region}:{account_id}:{api_id}/*/*/*")
}

async fn ensure_http_api(
    clients: &AwsClients,
    api_name: &str,
    function_arn: &str,
    account_id: &str,
) -> Result<String, String> {
    let apigw = &clients.apigw;

    let api_id = match clients.api_ids_named(api_name).await?.into_iter().next() {
        Some(api_id) => api_id,
        None => {
            let output = apigw
                .create_api()
                .name(api_name)
                .protocol_type(ProtocolType::Http)
                .cors_configuration(
                    Cors::builder()
                        .allow_origins("*")
                        .allow_methods("GET")
                        .allow_methods("OPTIONS")
                        .allow_headers("*")
                        .build(),
                )
                .send()
                .await
                .map_err(|error| format!("failed to create API {api_name}: {error}"))?;
            eprintln!("Created API: {api_name}");
            text(output.api_id())
                .map(str::to_string)
                .ok_or_else(|| format!("API {api_name} was created without an id"))?
        }
    };

    let integrations = apigw
        .get_integrations()
        .api_id(&api_id)
        .send()
        .await
        .map_err(|error| format!("failed to list integrations of {api_id}: {error}"))?;
    let existing_integration = integrations
        .items()
        .iter()
        .find(|integration| text(integration.integration_uri()) == Some(function_arn))
        .and_then(|integration| text(integration.integration_id()))
        .map(str::to_string);

    let integration_id = match existing_integration {
        Some(integration_id) => integration_id,
        None => {
            let output = apigw
                .create_integration()
                .api_id(&api_id)
                .integration_type(IntegrationType::AwsProxy)
                .integration_uri(function_arn)
                .payload_format_version("2.0")
                .send()
                .await
                .map_err(|error| format!("failed to create integration on {api_id}: {error}"))?;
            text(output.integration_id())
                .map(str::to_string)
                .ok_or_else(|| format!("integration on {api_id} was created without an id"))?
        }
    };

    let routes = apigw
        .get_routes()
        .api_id(&api_id)
        .send()
        .await
        .map_err(|error| format!("failed to list routes of {api_id}: {error}"))?;
    let existing_routes: Vec<&str> = routes
        .items()
        .iter()
        .filter_map(|route| text(route.route_key()))
        .collect();

    for route_key in missing_routes(&existing_routes) {
        apigw
            .create_route()
            .api_id(&api_id)
            .route_key(route_key)
            .target(format!("integrations/{integration_id}"))
            .send()
            .await
            .map_err(|error| format!("failed to create route {route_key}: {error}"))?;
        eprintln!("Created route: {route_key}");
    }

    let stage = apigw
        .get_stage()
        .api_id(&api_id)
        .stage_name(DEFAULT_STAGE)
        .send()
        .await;
    if stage.is_ok() {
        apigw
            .update_stage()
            .api_id(&api_id)
            .stage_name(DEFAULT_STAGE)
            .auto_deploy(true)
            .send()
            .await
            .map_err(|error| format!("failed to update stage on {api_id}: {error}"))?;
    } else {
        apigw
            .create_stage()
            .api_id(&api_id)
            .stage_name(DEFAULT_STAGE)
            .auto_deploy(true)
            .send()
            .await
            .map_err(|error| format!("failed to create stage on {api_id}: {error}"))?;
    }

    add_invoke_permission(
        &clients.lambda,
        function_arn,
        &format!("apigw-{api_id}"),
        "apigateway.amazonaws.com",
        &execute_api_source_arn(&clients.region, account_id, &api_id),
    )
    .await?;

    let api = apigw
        .get_api()
        .api_id(&api_id)
        .send()
        .await
        .map_err(|error| format!("failed to read API {api_id}: {error}"))?;
    text(api.api_endpoint())
        .map(str::to_string)
        .ok_or_else(|| format!("API {api_id} has no endpoint"))
}

pub fn missing_routes<'a>(existing: &[&str]) -> Vec<&'a str> {
    API_ROUTES
        .iter()
        .copied()
        .filter(|route| !existing.contains(route))
        .collect()
}

async fn ensure_topic_and_subscription(
    sns: &aws_sdk_sns::Client,
    topic: &str,
    email: Option<&str>,
) -> Result<String, String> {
    let output = sns
        .create_topic()
        .name(topic)
        .send()
        .await
        .map_err(|error| format!("failed to create topic {topic}: {error}"))?;
    let topic_arn = output
        .topic_arn()
        .map(str::to_string)
        .ok_or_else(|| format!("topic {topic} has no ARN"))?;

    if let Some(email) = email {
        sns.subscribe()
            .topic_arn(&topic_arn)
            .protocol("email")
            .endpoint(email)
            .send()
            .await
            .map_err(|error| format!("failed to subscribe {email} to {topic}: {error}"))?;
        eprintln!("Subscribed {email} to {topic}");
    }

    Ok(topic_arn)
}

async fn ensure_event_source_mapping(
    clients: &AwsClients,
    function_arn: &str,
    stream_arn: &str,
) -> Result<String, String> {
    let lambda = &clients.lambda;
    let mappings = clients
        .event_source_mappings(function_arn)
        .await
        .map_err(|error| format!("failed to list mappings of {function_arn}: {error}"))?;
    if let Some((uuid, _)) = mappings
        .into_iter()
        .find(|(_, source)| source.as_deref() == Some(stream_arn))
    {
        return Ok(uuid);
    }

    let output = call_with_retries(RetryPolicy::LAMBDA_MUTATION, is_transient_sdk_error, || {
        lambda
            .create_event_source_mapping()
            .event_source_arn(stream_arn)
            .function_name(function_arn)
            .starting_position(EventSourcePosition::Latest)
            .batch_size(100)
            .maximum_batching_window_in_seconds(1)
            .enabled(true)
            .send()
    })
    .await
    .map_err(|error| format!("failed to map stream to {function_arn}: {error}"))?;

    output
        .uuid()
        .map(str::to_string)
        .ok_or_else(|| "event source mapping was created without a UUID".to_string())
}

async fn upload_web_dir(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    settings: &DeploySettings,
) -> Result<(), String> {
    for asset in collect_web_assets(&settings.web_dir)? {
        let body = fs::read(&asset.path)
            .map_err(|error| format!("failed to read {}: {error}", asset.path.display()))?;
        s3.put_object()
            .bucket(bucket)
            .key(&asset.key)
            .body(ByteStream::from(body))
            .content_type(asset.content_type)
            .send()
            .await
            .map_err(|error| format!("failed to upload {}: {error}", asset.key))?;
        eprintln!("Uploaded web asset: {}", asset.key);
    }
    Ok(())
}

async fn presign_index(s3: &aws_sdk_s3::Client, bucket: &str) -> Result<String, String> {
    let presigning = PresigningConfig::expires_in(PRESIGN_EXPIRY)
        .map_err(|error| format!("invalid presigning config: {error}"))?;
    let request = s3
        .get_object()
        .bucket(bucket)
        .key(INDEX_KEY)
        .presigned(presigning)
        .await
        .map_err(|error| format!("failed to presign {INDEX_KEY}: {error}"))?;
    Ok(request.uri().to_string())
}

/// Passes the API endpoint in the fragment. Extra query parameters would
/// break the presigned signature.
pub fn web_url_with_api(presigned_url: &str, api_endpoint: &str) -> String {
    format!("{presigned_url}#api={api_endpoint}")
}

pub fn render_summary(outputs: &DeployOutputs) -> String {
    let mut lines = vec![
        "=== DEPLOY OK ===".to_string(),
        format!("Uploads bucket: {}", outputs.uploads_bucket),
        format!("Web bucket:     {}", outputs.web_bucket),
        format!("DDB table:      {}", outputs.table),
        format!("DDB stream:     {}", outputs.stream_arn),
        format!("SNS topic:      {}", outputs.topic_arn),
        format!("Stream mapping: {}", outputs.mapping_uuid),
        format!("API endpoint:   {}", outputs.api_endpoint),
        format!("Test API:       {}/items", outputs.api_endpoint),
        format!("Test store:     {}/items/Berlin", outputs.api_endpoint),
        String::new(),
        "Web page (link expires in 1h):".to_string(),
        outputs.web_url.clone(),
        String::new(),
    ];

    if outputs.email_subscribed {
        lines.push("SNS email subscription: check your inbox and CONFIRM it.".to_string());
    } else {
        lines.push("NOTIFY_EMAIL not configured: no email subscription created.".to_string());
    }
    lines.push(String::new());
    lines.push(format!(
        "Next step: upload a CSV to {} to populate DynamoDB.",
        outputs.uploads_bucket
    ));

    lines.join("\n")
}
