use std::future::Future;
use std::time::{Duration, Instant};

use aws_sdk_lambda::error::ProvideErrorMetadata;

/// Error codes returned while a Lambda function is still being updated.
pub const TRANSIENT_ERROR_CODES: [&str; 2] =
    ["ResourceConflictException", "TooManyRequestsException"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const LAMBDA_MUTATION: Self = Self {
        attempts: 8,
        delay: Duration::from_secs(2),
    };
}

/// Errors without a service code (timeouts, dispatch failures) are retried
/// as well as the known transient codes.
pub fn is_transient_code(code: Option<&str>) -> bool {
    match code {
        None => true,
        Some(code) => TRANSIENT_ERROR_CODES.contains(&code),
    }
}

pub fn is_transient_sdk_error(error: &impl ProvideErrorMetadata) -> bool {
    is_transient_code(error.code())
}

pub async fn call_with_retries<T, E, F, Fut>(
    policy: RetryPolicy,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.attempts && is_retryable(&error) => {
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending(String),
    Failed(String),
}

/// Polls `check` until it reports ready or failed, or `timeout` elapses.
pub async fn wait_until<F, Fut>(
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> Result<(), String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness, String>>,
{
    let started_at = Instant::now();
    loop {
        match check().await? {
            Readiness::Ready => return Ok(()),
            Readiness::Failed(reason) => return Err(format!("{what} failed: {reason}")),
            Readiness::Pending(status) => {
                if started_at.elapsed() >= timeout {
                    return Err(format!(
                        "{what} not ready after {}s ({status})",
                        timeout.as_secs()
                    ));
                }
            }
        }
        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn transient_codes_include_transport_failures() {
        assert!(is_transient_code(None));
        assert!(is_transient_code(Some("ResourceConflictException")));
        assert!(is_transient_code(Some("TooManyRequestsException")));
        assert!(!is_transient_code(Some("InvalidParameterValueException")));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Cell::new(0u32);
        let result: Result<u32, String> = call_with_retries(quick(5), |_| true, || {
            calls.set(calls.get() + 1);
            let current = calls.get();
            async move {
                if current < 3 {
                    Err("ResourceConflictException".to_string())
                } else {
                    Ok(current)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_policy_attempts() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = call_with_retries(quick(4), |_| true, || {
            calls.set(calls.get() + 1);
            async { Err("TooManyRequestsException".to_string()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Cell::new(0u32);
        let result: Result<(), String> = call_with_retries(
            quick(8),
            |error: &String| error.contains("Conflict"),
            || {
                calls.set(calls.get() + 1);
                async { Err("AccessDenied".to_string()) }
            },
        )
        .await;

        assert_eq!(result, Err("AccessDenied".to_string()));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn wait_until_reports_failure_and_timeout() {
        let interval = Duration::from_millis(1);

        let failed = wait_until("Lambda demo", Duration::from_secs(5), interval, || async {
            Ok(Readiness::Failed("State=Failed".to_string()))
        })
        .await;
        assert_eq!(failed, Err("Lambda demo failed: State=Failed".to_string()));

        let timed_out = wait_until("Lambda demo", Duration::ZERO, interval, || async {
            Ok(Readiness::Pending("State=Pending".to_string()))
        })
        .await;
        assert_eq!(
            timed_out,
            Err("Lambda demo not ready after 0s (State=Pending)".to_string())
        );
    }
}
