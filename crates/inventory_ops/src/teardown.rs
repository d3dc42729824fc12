//! Best-effort removal of everything `deploy` creates.
//!
//! Missing resources are skipped quietly; any other failure is recorded and
//! teardown moves on to the next resource.

use std::fmt::Display;
use std::future::Future;

use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use inventory_core::naming::ResourceNames;

use crate::clients::AwsClients;
use crate::sdk::{flag, is_missing_resource};
use crate::step;

/// `DeleteObjects` accepts at most this many keys per request.
pub const DELETE_OBJECTS_LIMIT: usize = 1000;
pub const PENDING_CONFIRMATION: &str = "PendingConfirmation";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub removed: Vec<String>,
    pub failures: Vec<String>,
}

impl TeardownReport {
    fn removed(&mut self, what: impl Into<String>) {
        let what = what.into();
        eprintln!("Deleted {what}");
        self.removed.push(what);
    }

    fn failed(&mut self, failure: impl Into<String>) {
        let failure = failure.into();
        eprintln!("WARN: {failure}");
        self.failures.push(failure);
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn render(&self) -> String {
        if self.failures.is_empty() {
            format!("=== TEARDOWN OK === ({} resources deleted)", self.removed.len())
        } else {
            format!(
                "=== TEARDOWN FINISHED WITH {} WARNING(S) ===\n{}",
                self.failures.len(),
                self.failures.join("\n")
            )
        }
    }
}

/// Folds one deletion outcome into the report. Missing resources count as
/// already deleted.
pub fn record<T, E: Display>(
    report: &mut TeardownReport,
    what: String,
    outcome: Result<T, E>,
    is_missing: impl FnOnce(&E) -> bool,
) {
    match outcome {
        Ok(_) => report.removed(what),
        Err(error) if is_missing(&error) => {}
        Err(error) => report.failed(format!("failed to delete {what}: {error}")),
    }
}

/// Runs `run` for every item in order, threading the report through. A
/// failing item never stops the ones after it.
pub async fn run_each<S, F, Fut>(
    items: impl IntoIterator<Item = S>,
    mut report: TeardownReport,
    mut run: F,
) -> TeardownReport
where
    F: FnMut(S, TeardownReport) -> Fut,
    Fut: Future<Output = TeardownReport>,
{
    for item in items {
        report = run(item, report).await;
    }
    report
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    HttpApi,
    Functions,
    Topic,
    Table,
    Buckets,
}

impl TeardownStep {
    pub const ALL: [Self; 5] = [
        Self::HttpApi,
        Self::Functions,
        Self::Topic,
        Self::Table,
        Self::Buckets,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::HttpApi => "HTTP API",
            Self::Functions => "Lambda functions",
            Self::Topic => "SNS topic",
            Self::Table => "DynamoDB table",
            Self::Buckets => "Buckets",
        }
    }
}

/// Versions and delete markers first, then whatever the plain listing
/// still shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPhase {
    ObjectVersions,
    CurrentObjects,
}

impl EmptyPhase {
    pub const ALL: [Self; 2] = [Self::ObjectVersions, Self::CurrentObjects];
}

/// Unconfirmed email subscriptions have no real ARN and cannot be unsubscribed.
pub fn is_confirmed_subscription(subscription_arn: &str) -> bool {
    !subscription_arn.is_empty() && subscription_arn != PENDING_CONFIRMATION
}

pub async fn run_teardown(clients: &AwsClients, names: &ResourceNames) -> TeardownReport {
    run_each(
        TeardownStep::ALL,
        TeardownReport::default(),
        |teardown_step, mut report| async move {
            step(teardown_step.label());
            match teardown_step {
                TeardownStep::HttpApi => delete_apis(clients, &names.api, &mut report).await,
                TeardownStep::Functions => {
                    for function in names.functions() {
                        delete_function(clients, function, &mut report).await;
                    }
                }
                TeardownStep::Topic => delete_topics(clients, &names.topic, &mut report).await,
                TeardownStep::Table => {
                    let outcome = clients
                        .dynamodb
                        .delete_table()
                        .table_name(&names.table)
                        .send()
                        .await;
                    record(
                        &mut report,
                        format!("table {}", names.table),
                        outcome,
                        is_missing_resource,
                    );
                }
                TeardownStep::Buckets => {
                    for bucket in names.buckets() {
                        report = delete_bucket(clients, bucket, report).await;
                    }
                }
            }
            report
        },
    )
    .await
}

async fn delete_apis(clients: &AwsClients, api_name: &str, report: &mut TeardownReport) {
    let api_ids = match clients.api_ids_named(api_name).await {
        Ok(api_ids) => api_ids,
        Err(error) => return report.failed(error),
    };

    for api_id in api_ids {
        let outcome = clients.apigw.delete_api().api_id(&api_id).send().await;
        record(
            report,
            format!("API {api_name} ({api_id})"),
            outcome,
            is_missing_resource,
        );
    }
}

async fn delete_function(clients: &AwsClients, function: &str, report: &mut TeardownReport) {
    match clients.event_source_mappings(function).await {
        Ok(mappings) => {
            for (uuid, _) in mappings {
                let outcome = clients
                    .lambda
                    .delete_event_source_mapping()
                    .uuid(&uuid)
                    .send()
                    .await;
                record(
                    report,
                    format!("event source mapping {uuid}"),
                    outcome,
                    is_missing_resource,
                );
            }
        }
        Err(aws_sdk_lambda::Error::ResourceNotFoundException(_)) => {}
        Err(error) => report.failed(format!("failed to list mappings of {function}: {error}")),
    }

    let outcome = clients
        .lambda
        .delete_function()
        .function_name(function)
        .send()
        .await;
    record(
        report,
        format!("Lambda {function}"),
        outcome,
        is_missing_resource,
    );
}

async fn delete_topics(clients: &AwsClients, topic: &str, report: &mut TeardownReport) {
    let topic_arns = match clients.topic_arns_named(topic).await {
        Ok(topic_arns) => topic_arns,
        Err(error) => return report.failed(error),
    };

    for topic_arn in topic_arns {
        if let Err(error) = unsubscribe_all(clients, &topic_arn, report).await {
            report.failed(error);
        }
        let outcome = clients.sns.delete_topic().topic_arn(&topic_arn).send().await;
        record(
            report,
            format!("topic {topic_arn}"),
            outcome,
            is_missing_resource,
        );
    }
}

async fn unsubscribe_all(
    clients: &AwsClients,
    topic_arn: &str,
    report: &mut TeardownReport,
) -> Result<(), String> {
    let mut next_token: Option<String> = None;

    loop {
        let output = clients
            .sns
            .list_subscriptions_by_topic()
            .topic_arn(topic_arn)
            .set_next_token(next_token.take())
            .send()
            .await
            .map_err(|error| format!("failed to list subscriptions of {topic_arn}: {error}"))?;

        for subscription_arn in output
            .subscriptions()
            .iter()
            .filter_map(|subscription| subscription.subscription_arn())
            .filter(|arn| is_confirmed_subscription(arn))
        {
            let outcome = clients
                .sns
                .unsubscribe()
                .subscription_arn(subscription_arn)
                .send()
                .await;
            record(
                report,
                format!("subscription {subscription_arn}"),
                outcome,
                is_missing_resource,
            );
        }

        match output.next_token() {
            Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
            _ => return Ok(()),
        }
    }
}

async fn delete_bucket(
    clients: &AwsClients,
    bucket: &str,
    report: TeardownReport,
) -> TeardownReport {
    if clients.s3.head_bucket().bucket(bucket).send().await.is_err() {
        return report;
    }

    let mut report = run_each(EmptyPhase::ALL, report, |phase, mut report| async move {
        if let Err(error) = empty_bucket_phase(clients, bucket, phase).await {
            report.failed(error);
        }
        report
    })
    .await;

    let outcome = clients.s3.delete_bucket().bucket(bucket).send().await;
    record(
        &mut report,
        format!("bucket {bucket}"),
        outcome,
        is_missing_resource,
    );
    report
}

async fn empty_bucket_phase(
    clients: &AwsClients,
    bucket: &str,
    phase: EmptyPhase,
) -> Result<(), String> {
    match phase {
        EmptyPhase::ObjectVersions => delete_object_versions(clients, bucket).await,
        EmptyPhase::CurrentObjects => delete_current_objects(clients, bucket).await,
    }
}

async fn delete_object_versions(clients: &AwsClients, bucket: &str) -> Result<(), String> {
    let mut key_marker: Option<String> = None;
    let mut version_marker: Option<String> = None;

    loop {
        let output = clients
            .s3
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker.take())
            .set_version_id_marker(version_marker.take())
            .send()
            .await
            .map_err(|error| format!("failed to list versions in {bucket}: {error}"))?;

        let versions = output
            .versions()
            .iter()
            .filter_map(|version| {
                version
                    .key()
                    .map(|key| (key.to_string(), version.version_id().map(str::to_string)))
            })
            .chain(output.delete_markers().iter().filter_map(|marker| {
                marker
                    .key()
                    .map(|key| (key.to_string(), marker.version_id().map(str::to_string)))
            }))
            .collect::<Vec<_>>();
        delete_keys(clients, bucket, &versions).await?;

        if !flag(output.is_truncated()) {
            return Ok(());
        }
        key_marker = output.next_key_marker().map(str::to_string);
        version_marker = output.next_version_id_marker().map(str::to_string);
    }
}

async fn delete_current_objects(clients: &AwsClients, bucket: &str) -> Result<(), String> {
    let mut continuation: Option<String> = None;

    loop {
        let output = clients
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation.take())
            .send()
            .await
            .map_err(|error| format!("failed to list objects in {bucket}: {error}"))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(|key| (key.to_string(), None)))
            .collect::<Vec<_>>();
        delete_keys(clients, bucket, &objects).await?;

        match output.next_continuation_token() {
            Some(token) if flag(output.is_truncated()) => continuation = Some(token.to_string()),
            _ => return Ok(()),
        }
    }
}

async fn delete_keys(
    clients: &AwsClients,
    bucket: &str,
    keys: &[(String, Option<String>)],
) -> Result<(), String> {
    for batch in keys.chunks(DELETE_OBJECTS_LIMIT) {
        let objects = batch
            .iter()
            .map(|(key, version_id)| {
                ObjectIdentifier::builder()
                    .key(key)
                    .set_version_id(version_id.clone())
                    .build()
                    .map_err(|error| format!("invalid object identifier {key}: {error}"))
            })
            .collect::<Result<Vec<_>, String>>()?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|error| format!("invalid delete request for {bucket}: {error}"))?;

        clients
            .s3
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|error| format!("failed to delete objects in {bucket}: {error}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn pending_subscriptions_are_skipped() {
        assert!(!is_confirmed_subscription("PendingConfirmation"));
        assert!(!is_confirmed_subscription(""));
        assert!(is_confirmed_subscription(
            "arn:aws:sns:us-east-1:123456789012:inventory-low-stock-dev:1f2e"
        ));
    }

    #[test]
    fn record_separates_deleted_missing_and_failed() {
        let not_found = |error: &String| error == "NotFound";
        let mut report = TeardownReport::default();

        record(&mut report, "table Inventory".to_string(), Ok::<(), String>(()), not_found);
        record(
            &mut report,
            "topic inventory-low-stock-dev".to_string(),
            Err::<(), String>("NotFound".to_string()),
            not_found,
        );
        record(
            &mut report,
            "bucket inventory-web-dev".to_string(),
            Err::<(), String>("AccessDenied".to_string()),
            not_found,
        );

        assert_eq!(report.removed, vec!["table Inventory".to_string()]);
        assert_eq!(
            report.failures,
            vec!["failed to delete bucket inventory-web-dev: AccessDenied".to_string()]
        );
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn failing_step_does_not_stop_later_steps() {
        let visited = Mutex::new(Vec::new());

        let report = run_each(
            TeardownStep::ALL,
            TeardownReport::default(),
            |teardown_step, mut report| {
                visited.lock().expect("lock").push(teardown_step);
                async move {
                    match teardown_step {
                        TeardownStep::HttpApi | TeardownStep::Table => {
                            report.failed(format!("{} failed", teardown_step.label()))
                        }
                        _ => report.removed(teardown_step.label()),
                    }
                    report
                }
            },
        )
        .await;

        assert_eq!(*visited.lock().expect("lock"), TeardownStep::ALL.to_vec());
        assert_eq!(
            report.failures,
            vec!["HTTP API failed".to_string(), "DynamoDB table failed".to_string()]
        );
        assert_eq!(report.removed.len(), 3);
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn failed_version_listing_still_empties_current_objects() {
        let ran = Mutex::new(Vec::new());

        let report = run_each(EmptyPhase::ALL, TeardownReport::default(), |phase, mut report| {
            ran.lock().expect("lock").push(phase);
            async move {
                let outcome = match phase {
                    EmptyPhase::ObjectVersions => {
                        Err("failed to list versions in inventory-web-dev: AccessDenied")
                    }
                    EmptyPhase::CurrentObjects => Ok(()),
                };
                if let Err(error) = outcome {
                    report.failed(error);
                }
                report
            }
        })
        .await;

        assert_eq!(
            *ran.lock().expect("lock"),
            vec![EmptyPhase::ObjectVersions, EmptyPhase::CurrentObjects]
        );
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn report_lists_warnings() {
        let mut report = TeardownReport::default();
        report.removed("table Inventory");
        assert!(report.succeeded());
        assert_eq!(report.render(), "=== TEARDOWN OK === (1 resources deleted)");

        report.failed("failed to delete bucket inventory-web-dev: AccessDenied");
        assert_eq!(
            report.render(),
            "=== TEARDOWN FINISHED WITH 1 WARNING(S) ===\n\
             failed to delete bucket inventory-web-dev: AccessDenied"
        );
    }
}
