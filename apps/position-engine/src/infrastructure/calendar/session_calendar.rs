//! Fixed-window market calendar.
//!
//! A session is open on a trading weekday that is not a listed holiday,
//! between the open and close times in the exchange's fixed UTC offset.
//! The window is half-open: trading is permitted at the open instant and not
//! at the close instant.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};

use crate::application::ports::MarketCalendarPort;

const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Session window in exchange-local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWindow {
    /// Session open.
    pub open: NaiveTime,
    /// Session close.
    pub close: NaiveTime,
    /// Exchange offset from UTC.
    pub offset: FixedOffset,
    /// Weekdays with a session.
    pub trading_days: Vec<Weekday>,
}

impl SessionWindow {
    /// NSE cash session: 09:15 to 15:30 IST, Monday to Friday.
    #[must_use]
    pub fn nse() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 15, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(15, 30, 0).unwrap_or(NaiveTime::MIN),
            offset: FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
            trading_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }
}

/// Market calendar from a [`SessionWindow`] and a holiday list.
#[derive(Debug, Clone)]
pub struct SessionCalendar {
    window: SessionWindow,
    holidays: HashSet<NaiveDate>,
}

impl SessionCalendar {
    /// Create a calendar.
    #[must_use]
    pub fn new(window: SessionWindow, holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            window,
            holidays: holidays.into_iter().collect(),
        }
    }

    fn is_trading_day(&self, date: NaiveDate) -> bool {
        self.window.trading_days.contains(&date.weekday()) && !self.holidays.contains(&date)
    }

    fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.window.offset)
    }
}

impl MarketCalendarPort for SessionCalendar {
    fn is_session_open(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        let time = local.time();
        self.is_trading_day(local.date_naive())
            && time >= self.window.open
            && time < self.window.close
    }

    fn session_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.local(now).date_naive()
    }

    fn is_after_close(&self, now: DateTime<Utc>) -> bool {
        let local = self.local(now);
        self.is_trading_day(local.date_naive()) && local.time() >= self.window.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn calendar() -> SessionCalendar {
        let holiday = NaiveDate::from_ymd_opt(2026, 1, 26).unwrap();
        SessionCalendar::new(SessionWindow::nse(), [holiday])
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test_case("2026-01-27T09:15:00+05:30", true ; "at open")]
    #[test_case("2026-01-27T09:14:59+05:30", false ; "before open")]
    #[test_case("2026-01-27T12:00:00+05:30", true ; "midday")]
    #[test_case("2026-01-27T15:29:59+05:30", true ; "just before close")]
    #[test_case("2026-01-27T15:30:00+05:30", false ; "at close")]
    #[test_case("2026-01-24T11:00:00+05:30", false ; "saturday")]
    #[test_case("2026-01-25T11:00:00+05:30", false ; "sunday")]
    #[test_case("2026-01-26T11:00:00+05:30", false ; "holiday")]
    #[test_case("2026-01-27T04:00:00Z", true ; "utc input converted")]
    fn session_open(now: &str, expected: bool) {
        assert_eq!(calendar().is_session_open(at(now)), expected);
    }

    #[test_case("2026-01-27T15:30:00+05:30", true ; "at close")]
    #[test_case("2026-01-27T23:59:00+05:30", true ; "late evening")]
    #[test_case("2026-01-27T10:00:00+05:30", false ; "during session")]
    #[test_case("2026-01-26T16:00:00+05:30", false ; "holiday evening")]
    fn after_close(now: &str, expected: bool) {
        assert_eq!(calendar().is_after_close(at(now)), expected);
    }

    #[test]
    fn session_date_uses_exchange_offset() {
        // 20:00 UTC is already the next day in IST.
        let date = calendar().session_date(at("2026-01-27T20:00:00Z"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 28).unwrap());
    }
}
