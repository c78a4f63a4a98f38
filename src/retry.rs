// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retries with exponential backoff for remote calls.
//!
//! The reconciler core never retries. Retries live in the transports around
//! it: the ARM gateway client retries throttling, 5xx and connection failures
//! under [`BackoffPolicy::ARM`], and the Ingress lookup retries transient
//! Kubernetes API errors under [`BackoffPolicy::KUBERNETES`]. Permanent errors
//! fail on the first attempt.

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::StatusCode;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Shape of a retry schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_interval: Duration,
    /// Upper bound for a single delay
    pub max_interval: Duration,
    /// Give up once this much time has passed since the first attempt; `None` retries forever
    pub max_elapsed_time: Option<Duration>,
    /// Growth factor between consecutive delays
    pub multiplier: f64,
    /// Jitter as a fraction of the delay (0.1 = ±10%)
    pub randomization_factor: f64,
}

impl BackoffPolicy {
    /// Kubernetes API calls.
    ///
    /// 100ms doubling up to 30s, ±10% jitter, 5 minutes in total.
    pub const KUBERNETES: Self = Self {
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_secs(30),
        max_elapsed_time: Some(Duration::from_secs(300)),
        multiplier: 2.0,
        randomization_factor: 0.1,
    };

    /// Azure Resource Manager calls.
    ///
    /// # Retry Schedule
    ///
    /// 50ms, 100ms, 200ms, 400ms, 800ms, 1.6s, 3.2s, 6.4s, then 10s intervals
    /// until 2 minutes have elapsed (±10% jitter on each).
    pub const ARM: Self = Self {
        initial_interval: Duration::from_millis(50),
        max_interval: Duration::from_secs(10),
        max_elapsed_time: Some(Duration::from_secs(120)),
        multiplier: 2.0,
        randomization_factor: 0.1,
    };

    /// Jitter-free policy with a fixed delay, giving up after `max_elapsed_time`.
    #[must_use]
    pub const fn fixed(interval: Duration, max_elapsed_time: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            max_elapsed_time: Some(max_elapsed_time),
            multiplier: 1.0,
            randomization_factor: 0.0,
        }
    }

    /// Start a fresh schedule; the elapsed clock starts now.
    #[must_use]
    pub fn start(self) -> ExponentialBackoff {
        ExponentialBackoff {
            policy: self,
            next_interval: self.initial_interval,
            started: Instant::now(),
        }
    }
}

/// A running retry schedule.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    policy: BackoffPolicy,
    next_interval: Duration,
    started: Instant,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Delay before the next attempt, or `None` once the schedule is exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self
            .policy
            .max_elapsed_time
            .is_some_and(|limit| self.started.elapsed() >= limit)
        {
            return None;
        }

        let interval = self.next_interval;
        let grown = interval.as_secs_f64() * self.policy.multiplier;
        self.next_interval = Duration::from_secs_f64(grown).min(self.policy.max_interval);

        Some(self.jittered(interval))
    }

    fn jittered(&self, interval: Duration) -> Duration {
        let factor = self.policy.randomization_factor;
        if factor <= 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let spread = secs * factor;
        let picked = rand::rng().random_range((secs - spread)..=(secs + spread));
        Duration::from_secs_f64(picked.max(0.0))
    }
}

/// HTTP statuses worth retrying: 429 and the transient 5xx family.
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or `policy` is exhausted.
///
/// Errors come back unchanged, so callers keep their typed errors.
///
/// # Errors
///
/// The first non-retryable error, or the last retryable one once the schedule
/// gives up.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    policy: BackoffPolicy,
    operation_name: &str,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut backoff = policy.start();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?backoff.started.elapsed(),
                        "Call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !is_retryable(&err) {
            debug!(operation = operation_name, error = %err, "Permanent error, not retrying");
            return Err(err);
        }

        let Some(delay) = backoff.next_backoff() else {
            error!(
                operation = operation_name,
                attempt,
                elapsed = ?backoff.started.elapsed(),
                error = %err,
                "Retries exhausted"
            );
            return Err(err);
        };

        warn!(
            operation = operation_name,
            attempt,
            retry_after = ?delay,
            error = %err,
            "Transient error, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Retry a Kubernetes API call under [`BackoffPolicy::KUBERNETES`].
///
/// # Errors
///
/// The Kubernetes error, with `operation_name` as context, once it is
/// permanent or the schedule is exhausted.
pub async fn retry_api_call<T, F, Fut>(operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, kube::Error>>,
{
    retry_with_backoff(
        BackoffPolicy::KUBERNETES,
        operation_name,
        is_retryable_kube_error,
        operation,
    )
    .await
    .with_context(|| format!("Kubernetes API call failed: {operation_name}"))
}

/// 429, 5xx and service (network) errors.
fn is_retryable_kube_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(status) => status.code == 429 || (500..600).contains(&status.code),
        kube::Error::Service(_) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
