//! Session trade statistics.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::application::dto::OpenStatus;
use crate::domain::position_lifecycle::CloseReason;

/// Counters for the current trading session.
#[derive(Debug, Default)]
pub struct SessionStats {
    opened: AtomicU64,
    degraded: AtomicU64,
    flattened: AtomicU64,
    take_profit_hits: AtomicU64,
    stop_loss_hits: AtomicU64,
    manual_closes: AtomicU64,
    reversals: AtomicU64,
    emergency_exits: AtomicU64,
    partial_fills: AtomicU64,
    summarized: Mutex<Option<NaiveDate>>,
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Positions opened (including degraded).
    pub opened: u64,
    /// Positions opened with a failed target leg.
    pub degraded: u64,
    /// Entries flattened because the stop could not be placed.
    pub flattened: u64,
    /// Positions closed by the take-profit.
    pub take_profit_hits: u64,
    /// Positions closed by the stop-loss.
    pub stop_loss_hits: u64,
    /// Operator closes.
    pub manual_closes: u64,
    /// Positions closed by a reversing signal.
    pub reversals: u64,
    /// Emergency market exits of open positions.
    pub emergency_exits: u64,
    /// Partial take-profit fills.
    pub partial_fills: u64,
    /// `take_profit_hits / (take_profit_hits + stop_loss_hits)` as a percentage.
    pub win_rate: f64,
}

impl SessionStats {
    /// Create zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an `open_position` outcome.
    pub fn record_open(&self, status: OpenStatus) {
        match status {
            OpenStatus::Open => {
                self.opened.fetch_add(1, Ordering::Relaxed);
            }
            OpenStatus::Degraded => {
                self.opened.fetch_add(1, Ordering::Relaxed);
                self.degraded.fetch_add(1, Ordering::Relaxed);
            }
            OpenStatus::Flattened => {
                self.flattened.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Count a position leaving the book.
    pub fn record_close(&self, reason: CloseReason) {
        let counter = match reason {
            CloseReason::TakeProfitHit => &self.take_profit_hits,
            CloseReason::StopLossHit => &self.stop_loss_hits,
            CloseReason::Manual => &self.manual_closes,
            CloseReason::Reversal => &self.reversals,
            CloseReason::Emergency => &self.emergency_exits,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a partial take-profit fill.
    pub fn record_partial_fill(&self) {
        self.partial_fills.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(&self) -> StatsSnapshot {
        let take_profit_hits = self.take_profit_hits.load(Ordering::Relaxed);
        let stop_loss_hits = self.stop_loss_hits.load(Ordering::Relaxed);
        let decided = take_profit_hits + stop_loss_hits;
        let win_rate = if decided == 0 {
            0.0
        } else {
            take_profit_hits as f64 / decided as f64 * 100.0
        };

        StatsSnapshot {
            opened: self.opened.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            flattened: self.flattened.load(Ordering::Relaxed),
            take_profit_hits,
            stop_loss_hits,
            manual_closes: self.manual_closes.load(Ordering::Relaxed),
            reversals: self.reversals.load(Ordering::Relaxed),
            emergency_exits: self.emergency_exits.load(Ordering::Relaxed),
            partial_fills: self.partial_fills.load(Ordering::Relaxed),
            win_rate,
        }
    }

    /// Mark the summary for `date` as sent. Returns `false` when it already
    /// was; `reset` leaves the mark alone.
    pub fn mark_summarized(&self, date: NaiveDate) -> bool {
        let mut summarized = self.summarized.lock();
        if *summarized == Some(date) {
            return false;
        }
        *summarized = Some(date);
        true
    }

    /// Zero every counter and return the values they held.
    pub fn reset(&self) -> StatsSnapshot {
        let snapshot = self.snapshot();
        for counter in [
            &self.opened,
            &self.degraded,
            &self.flattened,
            &self.take_profit_hits,
            &self.stop_loss_hits,
            &self.manual_closes,
            &self.reversals,
            &self.emergency_exits,
            &self.partial_fills,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_rate_counts_only_decided_trades() {
        let stats = SessionStats::new();
        stats.record_open(OpenStatus::Open);
        stats.record_open(OpenStatus::Degraded);
        stats.record_close(CloseReason::TakeProfitHit);
        stats.record_close(CloseReason::TakeProfitHit);
        stats.record_close(CloseReason::StopLossHit);
        stats.record_close(CloseReason::Manual);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.opened, 2);
        assert_eq!(snapshot.degraded, 1);
        assert!((snapshot.win_rate - 66.666).abs() < 0.01);
    }

    #[test]
    fn empty_session_has_zero_win_rate() {
        assert!(SessionStats::new().snapshot().win_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn reset_returns_previous_values() {
        let stats = SessionStats::new();
        stats.record_open(OpenStatus::Flattened);
        let before = stats.reset();
        assert_eq!(before.flattened, 1);
        assert_eq!(stats.snapshot().flattened, 0);
    }

    #[test]
    fn summary_mark_is_per_date_and_survives_reset() {
        let stats = SessionStats::new();
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();

        assert!(stats.mark_summarized(monday));
        stats.reset();
        assert!(!stats.mark_summarized(monday));
        assert!(stats.mark_summarized(tuesday));
    }
}
