//! Prometheus metrics for the position engine.
//!
//! Every series is prefixed `position_engine_`. Recording before
//! [`init_metrics`] is a no-op, which keeps the services usable in tests.

use std::net::{Ipv4Addr, SocketAddr};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

const POSITIONS_OPENED: &str = "position_engine_positions_opened_total";
const POSITIONS_CLOSED: &str = "position_engine_positions_closed_total";
const EMERGENCY_EXITS: &str = "position_engine_emergency_exits_total";
const OPEN_POSITIONS: &str = "position_engine_open_positions";
const BROKER_RETRIES: &str = "position_engine_broker_retries_total";
const RECONCILIATION_RUNS: &str = "position_engine_reconciliation_runs_total";
const RECONCILIATION_DIVERGENCES: &str = "position_engine_reconciliation_divergences_total";
const REARMED: &str = "position_engine_child_orders_rearmed_total";

/// Where the exporter listens.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address of the `/metrics` listener.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 9090)),
        }
    }
}

impl MetricsConfig {
    /// Listen on `addr`.
    #[must_use]
    pub const fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Install the Prometheus recorder and its HTTP listener.
///
/// # Errors
///
/// Returns an error if the recorder is already installed or the listener
/// cannot bind.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;
    describe();

    tracing::info!(addr = %config.listen_addr, "Prometheus metrics exporter started");
    Ok(())
}

fn describe() {
    describe_counter!(POSITIONS_OPENED, "open_position calls that filled, by outcome status");
    describe_counter!(POSITIONS_CLOSED, "Positions removed from the book, by close reason");
    describe_counter!(EMERGENCY_EXITS, "Market exits issued for positions without a stop");
    describe_gauge!(OPEN_POSITIONS, "Positions currently tracked");
    describe_counter!(BROKER_RETRIES, "Broker calls retried by the gateway decorator");
    describe_counter!(RECONCILIATION_RUNS, "Completed reconciliation passes");
    describe_counter!(RECONCILIATION_DIVERGENCES, "Reconciliation findings, by kind");
    describe_counter!(REARMED, "Resting exits recreated after a broker-side cancel");
}

/// Metrics exporter errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Recorder or listener could not be installed.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Position Lifecycle Metrics
// ============================================================================

/// Record a completed `open_position` (`open`, `degraded`, `flattened`).
pub fn record_position_opened(status: &str) {
    counter!(POSITIONS_OPENED, "status" => status.to_string()).increment(1);
}

/// Record a position leaving the book.
pub fn record_position_closed(reason: &str) {
    counter!(POSITIONS_CLOSED, "reason" => reason.to_string()).increment(1);
}

/// Record a market order issued because a position could not be protected.
pub fn record_emergency_exit() {
    counter!(EMERGENCY_EXITS).increment(1);
}

/// Update the number of positions currently tracked.
#[allow(clippy::cast_precision_loss)]
pub fn update_open_positions(count: usize) {
    gauge!(OPEN_POSITIONS).set(count as f64);
}

// ============================================================================
// Broker Metrics
// ============================================================================

/// Record a retried broker call.
pub fn record_broker_retry(operation: &str) {
    counter!(BROKER_RETRIES, "operation" => operation.to_string()).increment(1);
}

// ============================================================================
// Background Task Metrics
// ============================================================================

/// Record the findings of one reconciliation pass.
pub fn record_reconciliation(ghosts: usize, untracked: usize, mismatches: usize) {
    counter!(RECONCILIATION_RUNS).increment(1);
    counter!(RECONCILIATION_DIVERGENCES, "kind" => "ghost").increment(ghosts as u64);
    counter!(RECONCILIATION_DIVERGENCES, "kind" => "untracked")
        .increment(untracked as u64);
    counter!(RECONCILIATION_DIVERGENCES, "kind" => "quantity_mismatch")
        .increment(mismatches as u64);
}

/// Record a resting exit recreated after a broker-side cancel.
pub fn record_rearm(slot: &str) {
    counter!(REARMED, "slot" => slot.to_string()).increment(1);
}
