//! Metrics definitions for the control plane
//!
//! All metrics follow Prometheus naming conventions:
//! - `fed_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `status`: 2 values (success, error)
//! - `operation`: bounded by code (add, delete, bootstrap, clean, ...)
//! - `kind`: bounded by the storage kinds
//! - `outcome`: 3 values for authentication (actor, anonymous, failed)

use super::Outcome;
use metrics::{counter, histogram};
use std::time::Duration;

// ============================================================================
// Provisioning Metrics
// ============================================================================

/// Metric: `fed_actor_provisioning_total`
/// Labels: `operation`, `status`
pub fn record_actor_operation(operation: &'static str, status: Outcome) {
    counter!("fed_actor_provisioning_total", "operation" => operation, "status" => status.as_str())
        .increment(1);
}

/// Metric: `fed_client_operations_total`
/// Labels: `operation`, `status`
pub fn record_client_operation(operation: &'static str, status: Outcome) {
    counter!("fed_client_operations_total", "operation" => operation, "status" => status.as_str())
        .increment(1);
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record the result of resolving the acting identity of a request
///
/// Metric: `fed_auth_resolutions_total`
/// Labels: `outcome` (actor, anonymous, failed)
pub fn record_auth_resolution(outcome: &'static str) {
    counter!("fed_auth_resolutions_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// Storage Metrics
// ============================================================================

/// Metric: `fed_storage_lifecycle_duration_seconds`
/// Labels: `kind`, `operation`, `status`
pub fn record_storage_lifecycle(
    kind: &'static str,
    operation: &'static str,
    status: Outcome,
    duration: Duration,
) {
    histogram!(
        "fed_storage_lifecycle_duration_seconds",
        "kind" => kind,
        "operation" => operation,
        "status" => status.as_str()
    )
    .record(duration.as_secs_f64());
}
