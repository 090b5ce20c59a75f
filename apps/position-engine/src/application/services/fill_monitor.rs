//! Fill Monitor Service
//!
//! Polls the status of every resting child order and drives the resulting
//! transitions through the orchestrator. Per symbol the slots are checked in
//! the order partial take-profit, take-profit, stop-loss; once a position
//! leaves the book it is not examined again in the same scan.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::orders::OrderStatus;
use crate::domain::position_lifecycle::{ChildSlot, Position};
use crate::domain::shared::{BrokerOrderId, Symbol};

use super::orchestrator::{ExitCompletion, PositionOrchestrator, RearmOutcome};

/// Configuration for the fill monitor.
#[derive(Debug, Clone)]
pub struct FillMonitorConfig {
    /// Time between scans.
    pub interval: Duration,
    /// Recreate exits the broker reports cancelled or rejected.
    pub rearm_cancelled_orders: bool,
}

impl Default for FillMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            rearm_cancelled_orders: true,
        }
    }
}

/// What one scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorScan {
    /// Positions examined.
    pub examined: usize,
    /// Stops resized after a partial fill.
    pub partial_adjustments: usize,
    /// Positions reduced by a take-profit that filled ahead of the partial.
    pub reductions: usize,
    /// Symbols that left the book during the scan.
    pub closed: Vec<String>,
    /// Exits recreated after a broker-side cancel.
    pub rearmed: usize,
    /// Errors met (status checks, adjustments).
    pub errors: Vec<String>,
}

/// Background fill monitor.
#[derive(Debug)]
pub struct FillMonitor {
    orchestrator: Arc<PositionOrchestrator>,
    config: FillMonitorConfig,
}

impl FillMonitor {
    /// Create a monitor over the orchestrator's book.
    #[must_use]
    pub const fn new(orchestrator: Arc<PositionOrchestrator>, config: FillMonitorConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run one scan over every open position.
    pub async fn run_once(&self) -> MonitorScan {
        let mut scan = MonitorScan::default();

        for position in self.orchestrator.positions() {
            scan.examined += 1;
            self.scan_position(position, &mut scan).await;
        }

        if !scan.closed.is_empty() || scan.reductions > 0 || !scan.errors.is_empty() {
            tracing::info!(
                examined = scan.examined,
                closed = scan.closed.len(),
                partial_adjustments = scan.partial_adjustments,
                reductions = scan.reductions,
                errors = scan.errors.len(),
                "Fill monitor scan complete"
            );
        }
        scan
    }

    async fn scan_position(&self, position: Position, scan: &mut MonitorScan) {
        let symbol = position.symbol.clone();

        if !position.partial_filled
            && let Some(partial) = position.child(ChildSlot::PartialTakeProfit)
            && self
                .check_slot(&symbol, ChildSlot::PartialTakeProfit, &partial.order_id, scan)
                .await
        {
            return;
        }

        // The partial adjustment may have replaced the stop.
        let Some(position) = self.orchestrator.position(&symbol) else {
            return;
        };

        for slot in [ChildSlot::TakeProfit, ChildSlot::StopLoss] {
            if let Some(child) = position.child(slot)
                && self.check_slot(&symbol, slot, &child.order_id, scan).await
            {
                return;
            }
        }
    }

    /// Returns `true` when the position left the book or its child orders
    /// changed, so the rest of this scan's snapshot is stale.
    async fn check_slot(
        &self,
        symbol: &Symbol,
        slot: ChildSlot,
        order_id: &BrokerOrderId,
        scan: &mut MonitorScan,
    ) -> bool {
        let report = match self.orchestrator.broker().order_status(order_id).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(%symbol, %slot, %order_id, error = %e, "Status check failed");
                scan.errors.push(format!("{symbol} {slot}: {e}"));
                return false;
            }
        };

        match (report.status, slot) {
            (OrderStatus::Pending, _) | (_, ChildSlot::Entry) => false,
            (OrderStatus::Filled, ChildSlot::PartialTakeProfit) => {
                tracing::info!(%symbol, %order_id, "Partial take-profit filled");
                match self.orchestrator.adjust_on_partial_fill(symbol).await {
                    Ok(outcome) => {
                        scan.partial_adjustments += 1;
                        if outcome.closed {
                            scan.closed.push(symbol.to_string());
                            return true;
                        }
                        false
                    }
                    Err(e) => {
                        scan.errors.push(format!("{symbol} adjust: {e}"));
                        false
                    }
                }
            }
            (OrderStatus::Filled, ChildSlot::TakeProfit | ChildSlot::StopLoss) => {
                tracing::info!(%symbol, %slot, %order_id, "Exit filled");
                match self.orchestrator.complete_exit(symbol, slot, order_id).await {
                    Ok(ExitCompletion::Closed(_) | ExitCompletion::Flattened) => {
                        scan.closed.push(symbol.to_string());
                        true
                    }
                    Ok(ExitCompletion::Reduced { remaining_qty }) => {
                        tracing::info!(%symbol, remaining_qty, "Position reduced by take-profit");
                        scan.reductions += 1;
                        true
                    }
                    Ok(ExitCompletion::Skipped) => false,
                    Err(e) => {
                        scan.errors.push(format!("{symbol} {slot} fill: {e}"));
                        true
                    }
                }
            }
            (OrderStatus::Cancelled | OrderStatus::Rejected, _) => {
                if !self.config.rearm_cancelled_orders {
                    return false;
                }
                tracing::warn!(%symbol, %slot, %order_id, status = %report.status, "Resting exit no longer working");
                match self.orchestrator.rearm_slot(symbol, slot, order_id).await {
                    Ok(RearmOutcome::Rearmed { .. }) => {
                        scan.rearmed += 1;
                        false
                    }
                    Ok(RearmOutcome::Flattened) => {
                        scan.closed.push(symbol.to_string());
                        true
                    }
                    Ok(RearmOutcome::Dropped | RearmOutcome::Skipped) => false,
                    Err(e) => {
                        scan.errors.push(format!("{symbol} re-arm {slot}: {e}"));
                        false
                    }
                }
            }
        }
    }

    /// Run scans on the configured interval until `token` is cancelled.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval_secs = self.config.interval.as_secs(), "Fill monitor started");

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        tracing::info!("Fill monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }
        })
    }
}
