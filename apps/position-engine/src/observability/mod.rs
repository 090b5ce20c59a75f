//! Observability module for metrics.
//!
//! Prometheus counters and gauges for the position lifecycle. Tracing setup
//! lives in [`crate::telemetry`].

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_broker_retry, record_emergency_exit,
    record_position_closed, record_position_opened, record_rearm, record_reconciliation,
    update_open_positions,
};
