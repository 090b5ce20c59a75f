//! Daily Summary Service
//!
//! Sends the session statistics once per trading day after the close, then
//! resets them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::notifications;
use super::orchestrator::PositionOrchestrator;
use super::session_stats::StatsSnapshot;

/// Send the summary for `date` now and reset the session statistics.
pub async fn send_summary(orchestrator: &PositionOrchestrator, date: NaiveDate) -> StatsSnapshot {
    let snapshot = orchestrator.stats().reset();
    let open_positions = orchestrator.positions().len();
    tracing::info!(%date, opened = snapshot.opened, win_rate = snapshot.win_rate, "Sending daily summary");
    orchestrator
        .notifier()
        .notify(&notifications::daily_summary(date, &snapshot, open_positions))
        .await;
    snapshot
}

/// Sends the end-of-day summary.
#[derive(Debug)]
pub struct DailySummary {
    orchestrator: Arc<PositionOrchestrator>,
    check_interval: Duration,
}

impl DailySummary {
    /// Create the service; `check_interval` is how often the clock is checked.
    #[must_use]
    pub fn new(orchestrator: Arc<PositionOrchestrator>, check_interval: Duration) -> Self {
        Self::starting_at(orchestrator, check_interval, Utc::now())
    }

    /// Create the service as if the process started at `started_at`.
    ///
    /// A process started after the close has no figures for that session,
    /// so its summary is treated as already sent.
    #[must_use]
    pub fn starting_at(
        orchestrator: Arc<PositionOrchestrator>,
        check_interval: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        let calendar = orchestrator.calendar();
        if calendar.is_after_close(started_at) {
            let date = calendar.session_date(started_at);
            orchestrator.stats().mark_summarized(date);
            tracing::info!(%date, "Started after the close; no summary for this session");
        }
        Self {
            orchestrator,
            check_interval,
        }
    }

    /// Send the summary if the session for `now` has closed and it was not
    /// sent yet. Returns the reported figures.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Option<StatsSnapshot> {
        let calendar = self.orchestrator.calendar();
        if !calendar.is_after_close(now) {
            return None;
        }
        let date = calendar.session_date(now);
        if !self.orchestrator.stats().mark_summarized(date) {
            return None;
        }
        Some(send_summary(&self.orchestrator, date).await)
    }

    /// Check the clock on the configured interval until `token` is cancelled.
    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.check_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        self.run_once(Utc::now()).await;
                    }
                }
            }
        })
    }
}
