// Copyright (c) 2025 - Cowboy AI, Inc.
//! Caller-side retry of transient reconcile failures

use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::errors::{ReconcileError, ReconcileResult};

fn exponential(policy: &RetryPolicy) -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: policy.initial_interval,
        current_interval: policy.initial_interval,
        max_interval: policy.max_interval,
        max_elapsed_time: Some(policy.max_elapsed),
        ..ExponentialBackoff::default()
    }
}

/// Run `operation`, retrying retryable failures under `policy`
///
/// Without a policy the operation runs exactly once. Validation, conflict
/// and dependency failures are never retried.
pub async fn with_retry<T, F, Fut>(policy: Option<&RetryPolicy>, mut operation: F) -> ReconcileResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ReconcileResult<T>>,
{
    let Some(policy) = policy else {
        return operation().await;
    };

    backoff::future::retry_notify(
        exponential(policy),
        || {
            let attempt = operation();
            async move {
                attempt.await.map_err(|err| {
                    if err.is_retryable() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        },
        |err: ReconcileError, wait: Duration| {
            warn!("Retrying in {}ms after transient failure: {}", wait.as_millis(), err);
        },
    )
    .await
}
