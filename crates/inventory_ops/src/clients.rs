use aws_config::{BehaviorVersion, Region};

use crate::sdk::text;

/// Service clients for one region, built from the default credential chain.
pub struct AwsClients {
    pub region: String,
    pub s3: aws_sdk_s3::Client,
    pub dynamodb: aws_sdk_dynamodb::Client,
    pub lambda: aws_sdk_lambda::Client,
    pub apigw: aws_sdk_apigatewayv2::Client,
    pub sns: aws_sdk_sns::Client,
    pub sts: aws_sdk_sts::Client,
}

impl AwsClients {
    pub async fn load(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            region: region.to_string(),
            s3: aws_sdk_s3::Client::new(&config),
            dynamodb: aws_sdk_dynamodb::Client::new(&config),
            lambda: aws_sdk_lambda::Client::new(&config),
            apigw: aws_sdk_apigatewayv2::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
        }
    }

    pub async fn account_id(&self) -> Result<String, String> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|error| format!("failed to resolve caller identity: {error}"))?;
        identity
            .account()
            .map(str::to_string)
            .ok_or_else(|| "caller identity did not include an account id".to_string())
    }

    /// Ids of every HTTP API named `name`.
    pub async fn api_ids_named(&self, name: &str) -> Result<Vec<String>, String> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .apigw
                .get_apis()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|error| format!("failed to list APIs: {error}"))?;

            ids.extend(
                output
                    .items()
                    .iter()
                    .filter(|api| text(api.name()) == Some(name))
                    .filter_map(|api| text(api.api_id()).map(str::to_string)),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(ids),
            }
        }
    }

    /// Event source mappings attached to a function, as `(uuid, source arn)`.
    pub async fn event_source_mappings(
        &self,
        function: &str,
    ) -> Result<Vec<(String, Option<String>)>, aws_sdk_lambda::Error> {
        let mut mappings = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .lambda
                .list_event_source_mappings()
                .function_name(function)
                .set_marker(marker.take())
                .send()
                .await?;

            mappings.extend(output.event_source_mappings().iter().filter_map(|mapping| {
                mapping.uuid().map(|uuid| {
                    (
                        uuid.to_string(),
                        mapping.event_source_arn().map(str::to_string),
                    )
                })
            }));

            match output.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => return Ok(mappings),
            }
        }
    }

    /// ARNs of every topic whose name segment equals `topic`.
    pub async fn topic_arns_named(&self, topic: &str) -> Result<Vec<String>, String> {
        let suffix = format!(":{topic}");
        let mut arns = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let output = self
                .sns
                .list_topics()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|error| format!("failed to list topics: {error}"))?;

            arns.extend(
                output
                    .topics()
                    .iter()
                    .filter_map(|entry| entry.topic_arn())
                    .filter(|arn| arn.ends_with(&suffix))
                    .map(str::to_string),
            );

            match output.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => return Ok(arns),
            }
        }
    }
}
