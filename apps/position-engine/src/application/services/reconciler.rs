//! Reconciler Service
//!
//! Compares the local book with the broker's holdings. Broker state is
//! authoritative for positions that vanished; holdings the book does not know
//! about are only reported. The reconciler never places orders.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::Holding;
use crate::domain::shared::Symbol;
use crate::error::OrchestratorError;
use crate::observability;

use super::notifications;
use super::orchestrator::PositionOrchestrator;

/// Configuration for the reconciler.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Time between passes.
    pub interval: Duration,
    /// Positions younger than this are not compared (broker lag).
    pub grace_period: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            grace_period: Duration::from_secs(60),
        }
    }
}

/// Broker quantity differs from the local outstanding quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityMismatch {
    /// Symbol.
    pub symbol: String,
    /// Signed local outstanding quantity.
    pub local: i64,
    /// Signed broker quantity.
    pub broker: i64,
}

/// Findings of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Tracked locally, flat at the broker; removed from the book.
    pub ghosts: Vec<String>,
    /// Held at the broker, not tracked. Never adopted.
    pub untracked: Vec<Holding>,
    /// Quantity divergence (informational).
    pub mismatches: Vec<QuantityMismatch>,
    /// Positions inside the grace period.
    pub skipped: Vec<String>,
    /// When the pass finished.
    pub completed_at: DateTime<Utc>,
}

impl ReconciliationReport {
    /// Whether the pass found any divergence.
    #[must_use]
    pub fn has_divergence(&self) -> bool {
        !self.ghosts.is_empty() || !self.untracked.is_empty() || !self.mismatches.is_empty()
    }
}

/// Background reconciler.
#[derive(Debug)]
pub struct Reconciler {
    orchestrator: Arc<PositionOrchestrator>,
    config: ReconcilerConfig,
}

impl Reconciler {
    /// Create a reconciler over the orchestrator's book.
    #[must_use]
    pub const fn new(orchestrator: Arc<PositionOrchestrator>, config: ReconcilerConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// # Errors
    ///
    /// Returns error if the broker holdings cannot be listed. Nothing is
    /// changed in that case.
    pub async fn run_once(&self) -> Result<ReconciliationReport, OrchestratorError> {
        let holdings = self.orchestrator.broker().list_holdings().await?;
        let held: HashMap<&Symbol, i64> = holdings
            .iter()
            .filter(|h| h.quantity != 0)
            .map(|h| (&h.symbol, h.quantity))
            .collect();

        let positions = self.orchestrator.positions();
        let tracked: HashSet<&Symbol> = positions.iter().map(|p| &p.symbol).collect();
        let now = Utc::now();

        let mut ghosts = Vec::new();
        let mut mismatches = Vec::new();
        let mut skipped = Vec::new();

        for position in &positions {
            let age = now
                .signed_duration_since(position.created_at)
                .to_std()
                .unwrap_or_default();
            if age < self.config.grace_period {
                skipped.push(position.symbol.to_string());
                continue;
            }

            match held.get(&position.symbol) {
                None => {
                    if let Some(removed) = self
                        .orchestrator
                        .forget(&position.symbol, position.created_at)
                        .await
                    {
                        tracing::warn!(symbol = %removed.symbol, "Ghost position removed; not held at broker");
                        self.orchestrator
                            .notifier()
                            .notify(&notifications::ghost_removed(&removed))
                            .await;
                        ghosts.push(removed.symbol.to_string());
                    }
                }
                Some(&broker_qty) if broker_qty != position.signed_outstanding() => {
                    tracing::warn!(
                        symbol = %position.symbol,
                        local = position.signed_outstanding(),
                        broker = broker_qty,
                        "Quantity divergence"
                    );
                    mismatches.push(QuantityMismatch {
                        symbol: position.symbol.to_string(),
                        local: position.signed_outstanding(),
                        broker: broker_qty,
                    });
                }
                Some(_) => {}
            }
        }

        let untracked: Vec<Holding> = holdings
            .iter()
            .filter(|h| h.quantity != 0 && !tracked.contains(&h.symbol))
            .cloned()
            .collect();

        let notifier = self.orchestrator.notifier();
        if !untracked.is_empty() {
            tracing::warn!(count = untracked.len(), "Untracked broker holdings");
            let listed: Vec<(Symbol, i64)> = untracked
                .iter()
                .map(|h| (h.symbol.clone(), h.quantity))
                .collect();
            notifier
                .notify(&notifications::untracked_holdings(&listed))
                .await;
        }
        if !mismatches.is_empty() {
            let listed: Vec<(Symbol, i64, i64)> = mismatches
                .iter()
                .map(|m| (Symbol::new(m.symbol.as_str()), m.local, m.broker))
                .collect();
            notifier
                .notify(&notifications::quantity_mismatches(&listed))
                .await;
        }

        observability::record_reconciliation(ghosts.len(), untracked.len(), mismatches.len());
        let report = ReconciliationReport {
            ghosts,
            untracked,
            mismatches,
            skipped,
            completed_at: Utc::now(),
        };
        tracing::info!(
            ghosts = report.ghosts.len(),
            untracked = report.untracked.len(),
            mismatches = report.mismatches.len(),
            skipped = report.skipped.len(),
            "Reconciliation pass complete"
        );
        Ok(report)
    }

    /// Run passes on the configured interval until `token` is cancelled.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            tracing::info!(interval_secs = self.config.interval.as_secs(), "Reconciler started");

            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        tracing::info!("Reconciler stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            tracing::warn!(error = %e, "Reconciliation pass failed");
                        }
                    }
                }
            }
        })
    }
}
