//! # Retry Policy
//!
//! Attempt-budgeted retry with linear or exponential backoff.
//!
//! The delay before attempt `n + 1` is `initial * n` (linear) or
//! `initial * 2^(n-1)` (exponential), `n` being the attempt that just
//! failed. The helpers keep no state between calls and do not inspect
//! errors themselves; `retry_if` takes the classification as a predicate
//! and [`is_retryable`] is the classifier the managers use.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::{BackoffKind, RetryPolicy};
use crate::domain::{NetworkFailure, PoshError};

/// Parameters for one retried operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryOptions {
    /// Total attempts including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    /// Delay growth.
    pub backoff: BackoffKind,
    /// Delay after the first failure.
    pub initial_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from(&RetryPolicy::default())
    }
}

impl From<&RetryPolicy> for RetryOptions {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            backoff: policy.backoff,
            initial_delay: policy.initial_delay(),
        }
    }
}

/// Delay before the attempt following `attempt` (1-based).
pub fn backoff_delay(kind: BackoffKind, initial: Duration, attempt: u32) -> Duration {
    let attempt = attempt.max(1);
    match kind {
        BackoffKind::Linear => initial.saturating_mul(attempt),
        BackoffKind::Exponential => {
            let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
            initial.saturating_mul(factor)
        }
    }
}

/// True for failures worth another attempt: transport errors, timeouts,
/// rate limiting and HTTP 5xx.
pub fn is_retryable(error: &PoshError) -> bool {
    match error {
        PoshError::Network { failure, .. } => match failure {
            NetworkFailure::Transport | NetworkFailure::Timeout | NetworkFailure::RateLimited => {
                true
            }
            NetworkFailure::HttpStatus(status) => *status == 429 || (500..=599).contains(status),
            NetworkFailure::Rpc(_) => false,
        },
        _ => false,
    }
}

async fn run<T, E, F, Fut, P, C>(
    mut operation: F,
    options: &RetryOptions,
    should_retry: P,
    mut on_retry: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    C: FnMut(u32, &E),
    E: Display,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !should_retry(&err) {
                    return Err(err);
                }

                let delay = backoff_delay(options.backoff, options.initial_delay, attempt);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );
                on_retry(attempt, &err);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Run `operation` until it succeeds or the attempt budget is exhausted.
/// The last error is returned unchanged.
pub async fn retry<T, E, F, Fut>(operation: F, options: &RetryOptions) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    run(operation, options, |_| true, |_, _| {}).await
}

/// As [`retry`], calling `on_retry(attempt, &error)` after every failure
/// that will be followed by another attempt.
pub async fn retry_with_callback<T, E, F, Fut, C>(
    operation: F,
    options: &RetryOptions,
    on_retry: C,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: FnMut(u32, &E),
    E: Display,
{
    run(operation, options, |_| true, on_retry).await
}

/// As [`retry`], stopping at the first error `should_retry` rejects.
pub async fn retry_if<T, E, F, Fut, P>(
    operation: F,
    options: &RetryOptions,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    run(operation, options, should_retry, |_, _| {}).await
}
