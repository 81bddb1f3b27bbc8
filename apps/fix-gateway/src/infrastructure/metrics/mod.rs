//! Prometheus Metrics Module
//!
//! Installs the Prometheus recorder behind the `metrics` facade and
//! describes the gateway series. The services record through
//! [`crate::application::metrics`].
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first one.
///
/// # Errors
///
/// Returns `BuildError` if the recorder cannot be installed.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "fix_gateway_inbound_messages_total",
        "Total inbound messages dispatched to a handler"
    );
    describe_counter!(
        "fix_gateway_outbound_requests_total",
        "Total requests handed to the protocol engine"
    );
    describe_counter!(
        "fix_gateway_dropped_requests_total",
        "Total requests dropped because no session holds the required role"
    );
    describe_counter!(
        "fix_gateway_send_failures_total",
        "Total sends refused by the protocol engine"
    );

    describe_gauge!("fix_gateway_accounts", "Number of discovered accounts");
    describe_gauge!(
        "fix_gateway_active_subscriptions",
        "Number of active market data subscriptions"
    );
}

// =============================================================================
// Tests
// =============================================================================
