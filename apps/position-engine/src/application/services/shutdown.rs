//! Shutdown Coordinator
//!
//! On termination every resting exit is cancelled, once, in parallel, within
//! a fixed time budget. No market order is ever placed: open exposure stays
//! at the broker and the persisted positions let the next start re-arm it.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::{Deserialize, Serialize};

use crate::application::ports::{BrokerPort, NotifierPort};
use crate::domain::position_lifecycle::Position;

use super::notifications;

/// What the sweep managed to cancel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// `SYMBOL slot order_id` for each cancelled order.
    pub cancelled: Vec<String>,
    /// Orders whose cancel failed.
    pub failed: Vec<String>,
    /// Whether the time budget ran out with cancels still in flight.
    pub timed_out: bool,
}

/// Cancels resting exits on shutdown.
pub struct ShutdownCoordinator {
    broker: Arc<dyn BrokerPort>,
    notifier: Arc<dyn NotifierPort>,
    timeout: Duration,
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator.
    ///
    /// `broker` should be the undecorated gateway: the sweep makes a single
    /// attempt per order.
    #[must_use]
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        notifier: Arc<dyn NotifierPort>,
        timeout: Duration,
    ) -> Self {
        Self {
            broker,
            notifier,
            timeout,
        }
    }

    /// Cancel every resting exit of `positions`, then notify.
    pub async fn sweep(&self, positions: &[Position]) -> ShutdownReport {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut pending: FuturesUnordered<_> = positions
            .iter()
            .flat_map(|position| {
                position.resting_exits().into_iter().map(|(slot, child)| {
                    let label = format!("{} {slot} {}", position.symbol, child.order_id);
                    let order_id = child.order_id.clone();
                    let broker = Arc::clone(&self.broker);
                    async move { (label, broker.cancel_order(&order_id).await) }
                })
            })
            .collect();

        let mut report = ShutdownReport::default();
        loop {
            match tokio::time::timeout_at(deadline, pending.next()).await {
                Ok(Some((label, Ok(())))) => report.cancelled.push(label),
                Ok(Some((label, Err(e)))) if e.is_benign_cancel_failure() => {
                    tracing::debug!(order = %label, "Exit already closed at shutdown");
                }
                Ok(Some((label, Err(e)))) => {
                    tracing::warn!(order = %label, error = %e, "Shutdown cancel failed");
                    report.failed.push(label);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(remaining = pending.len(), "Shutdown sweep timed out");
                    report.timed_out = true;
                    break;
                }
            }
        }

        tracing::info!(
            cancelled = report.cancelled.len(),
            failed = report.failed.len(),
            timed_out = report.timed_out,
            "Shutdown sweep complete"
        );
        self.notifier
            .notify(&notifications::shutdown(
                report.cancelled.len(),
                &report.failed,
                report.timed_out,
            ))
            .await;
        report
    }
}
