// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for gateway reconciliation.
//!
//! All metrics use the `appgw_sync` namespace prefix.
//!
//! # Metrics
//!
//! - **Reconciliations** - count and duration per entrypoint and outcome
//! - **Applies** - full-snapshot writes sent to the control plane
//! - **Errors** - failures by entrypoint and [`GatewayError::reason`]
//!
//! [`GatewayError::reason`]: crate::errors::GatewayError::reason
//!
//! # Example
//!
//! ```rust,no_run
//! use appgw_sync::metrics::{gather_metrics, record_reconciliation_success};
//!
//! record_reconciliation_success("sync_pool", std::time::Duration::from_millis(250));
//! println!("{}", gather_metrics().unwrap());
//! ```

use prometheus::core::Collector;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "appgw_sync";

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Register `metric` with [`METRICS_REGISTRY`] and hand it back.
///
/// Each metric is a `LazyLock`, so this runs once per metric name.
fn registered<M: Collector + Clone + 'static>(metric: M) -> M {
    METRICS_REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric names are unique within the registry");
    metric
}

/// Total number of reconciliations by entrypoint and outcome
///
/// Labels:
/// - `operation`: Entrypoint (e.g., `sync_pool`, `delete_pool`)
/// - `status`: Outcome (`success`, `skipped`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of gateway reconciliations by operation and status",
    );
    registered(
        CounterVec::new(opts, &["operation", "status"])
            .expect("reconciliations_total labels are valid"),
    )
});

/// Duration of reconciliations in seconds, fetch through apply
///
/// Labels:
/// - `operation`: Entrypoint
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of gateway reconciliations in seconds by operation",
    )
    .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]);
    registered(
        HistogramVec::new(opts, &["operation"])
            .expect("reconciliation_duration_seconds labels are valid"),
    )
});

/// Total number of full-snapshot applies sent to the control plane
///
/// Labels:
/// - `operation`: Entrypoint that issued the apply
pub static GATEWAY_APPLIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_gateway_applies_total"),
        "Total number of gateway applies by operation",
    );
    registered(
        CounterVec::new(opts, &["operation"])
            .expect("gateway_applies_total labels are valid"),
    )
});

/// Total number of reconciliation errors
///
/// Labels:
/// - `operation`: Entrypoint
/// - `reason`: Error reason (e.g., `Conflict`, `TransportFailure`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of gateway reconciliation errors by operation and reason",
    );
    registered(
        CounterVec::new(opts, &["operation", "reason"])
            .expect("errors_total labels are valid"),
    )
});

/// Record a reconciliation that applied a new snapshot
pub fn record_reconciliation_success(operation: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation that finished without applying anything
pub fn record_reconciliation_skipped(operation: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "skipped"])
        .inc();
}

/// Record a failed reconciliation
///
/// # Arguments
/// * `operation` - Entrypoint that failed
/// * `reason` - Error reason label
/// * `duration` - Time spent before failing
pub fn record_reconciliation_error(operation: &str, reason: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "error"])
        .inc();
    ERRORS_TOTAL.with_label_values(&[operation, reason]).inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a full-snapshot apply
pub fn record_gateway_apply(operation: &str) {
    GATEWAY_APPLIES_TOTAL.with_label_values(&[operation]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
