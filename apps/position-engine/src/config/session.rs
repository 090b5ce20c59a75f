//! Trading session and instrument map configuration.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::infrastructure::calendar::{SessionCalendar, SessionWindow};

use super::{ConfigError, default_true};

/// Session window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session open, `HH:MM` exchange time.
    #[serde(default = "default_open")]
    pub open: String,
    /// Session close, `HH:MM` exchange time.
    #[serde(default = "default_close")]
    pub close: String,
    /// Exchange offset from UTC in minutes.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// Weekdays with a session (`mon`, `tue`, ...).
    #[serde(default = "default_trading_days")]
    pub trading_days: Vec<String>,
    /// Exchange holidays.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,
    /// Send the daily summary after the close.
    #[serde(default = "default_true")]
    pub daily_summary: bool,
    /// How often to check for the close, in seconds.
    #[serde(default = "default_summary_check_secs")]
    pub summary_check_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            open: default_open(),
            close: default_close(),
            utc_offset_minutes: default_utc_offset_minutes(),
            trading_days: default_trading_days(),
            holidays: Vec::new(),
            daily_summary: true,
            summary_check_interval_secs: default_summary_check_secs(),
        }
    }
}

impl SessionConfig {
    /// Build the market calendar.
    ///
    /// # Errors
    ///
    /// Returns error for unparseable times, offset or weekdays, or an open
    /// that is not before the close.
    pub fn to_calendar(&self) -> Result<SessionCalendar, ConfigError> {
        let open = parse_time("session.open", &self.open)?;
        let close = parse_time("session.close", &self.close)?;
        if open >= close {
            return Err(ConfigError::ValidationError(
                "session.open must be before session.close".to_string(),
            ));
        }

        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "session.utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            ))
        })?;

        let trading_days = self
            .trading_days
            .iter()
            .map(|day| {
                Weekday::from_str(day).map_err(|_| {
                    ConfigError::ValidationError(format!("session.trading_days: unknown day '{day}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SessionCalendar::new(
            SessionWindow {
                open,
                close,
                offset,
                trading_days,
            },
            self.holidays.iter().copied(),
        ))
    }

    /// Daily summary check interval.
    #[must_use]
    pub const fn summary_check_interval(&self) -> Duration {
        Duration::from_secs(self.summary_check_interval_secs)
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| ConfigError::ValidationError(format!("{field}: '{value}' is not HH:MM")))
}

/// Instrument map configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentsConfig {
    /// Symbol to instrument key entries.
    #[serde(default)]
    pub map: HashMap<String, String>,
    /// Optional JSON file with more entries.
    #[serde(default)]
    pub file: Option<String>,
    /// File reload interval in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for InstrumentsConfig {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            file: None,
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl InstrumentsConfig {
    /// File reload interval.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn default_open() -> String {
    "09:15".to_string()
}

fn default_close() -> String {
    "15:30".to_string()
}

const fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_trading_days() -> Vec<String> {
    ["mon", "tue", "wed", "thu", "fri"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

const fn default_summary_check_secs() -> u64 {
    30
}

const fn default_refresh_interval_secs() -> u64 {
    3_600
}
