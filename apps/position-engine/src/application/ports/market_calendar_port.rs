//! Market Calendar Port (Driven Port)
//!
//! Answers "is trading permitted right now".

use chrono::{DateTime, NaiveDate, Utc};

/// Port for trading-session queries.
pub trait MarketCalendarPort: Send + Sync {
    /// Whether the session is open at `now`.
    fn is_session_open(&self, now: DateTime<Utc>) -> bool;

    /// Exchange-local calendar date of `now`.
    fn session_date(&self, now: DateTime<Utc>) -> NaiveDate;

    /// Whether `now` falls on a trading day after that day's session closed.
    fn is_after_close(&self, now: DateTime<Utc>) -> bool;
}
