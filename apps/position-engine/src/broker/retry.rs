//! Broker retry policy.
//!
//! Delays grow geometrically from `initial_backoff` and are capped at
//! `max_backoff`; jitter spreads each delay by `±jitter_factor`. Which
//! failures are worth another attempt is decided elsewhere
//! (`BrokerError::is_retryable`); this module only answers "how long to wait".
//!
//! | Status | Class |
//! |--------|-------|
//! | 429 | [`HttpStatusClass::RateLimited`] |
//! | 408, 5xx | [`HttpStatusClass::Transient`] |
//! | anything else | [`HttpStatusClass::Permanent`] |

use std::time::Duration;

use rand::Rng;

/// How the gateway decorator retries a failed broker call.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerRetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for any single delay.
    pub max_backoff: Duration,
    /// Growth factor between retries.
    pub backoff_multiplier: f64,
    /// Random spread as a fraction of the delay (0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for BrokerRetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl BrokerRetryPolicy {
    /// Un-jittered delay before retry number `retry` (0-based), capped.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let cap = self.max_backoff.as_secs_f64();
        if !scaled.is_finite() || scaled >= cap {
            return self.max_backoff;
        }
        Duration::from_secs_f64(scaled.max(0.0))
    }

    /// Delays for one call, one per permitted retry.
    #[must_use]
    pub const fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            retry: 0,
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter_factor <= 0.0 || delay.is_zero() {
            return delay;
        }
        let spread = delay.as_secs_f64() * self.jitter_factor;
        let low = (delay.as_secs_f64() - spread).max(0.0);
        let high = delay.as_secs_f64() + spread;
        let picked = rand::rng().random_range(low..=high);
        Duration::from_secs_f64(picked).min(self.max_backoff)
    }
}

/// Iterator over the jittered delays of one call.
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a BrokerRetryPolicy,
    retry: u32,
}

impl Backoff<'_> {
    /// Retries handed out so far.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retry
    }
}

impl Iterator for Backoff<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retry >= self.policy.max_retries {
            return None;
        }
        let delay = self.policy.jittered(self.policy.base_delay(self.retry));
        self.retry += 1;
        Some(delay)
    }
}

/// Broker HTTP status classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatusClass {
    /// Throttled; safe to retry after a pause.
    RateLimited,
    /// Gateway or server trouble.
    Transient,
    /// The request itself was refused.
    Permanent,
}

impl HttpStatusClass {
    /// Classify a non-success status code.
    #[must_use]
    pub const fn of(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            408 | 500..=599 => Self::Transient,
            _ => Self::Permanent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn flat(max_retries: u32) -> BrokerRetryPolicy {
        BrokerRetryPolicy {
            max_retries,
            jitter_factor: 0.0,
            ..BrokerRetryPolicy::default()
        }
    }

    #[test]
    fn delays_double_until_budget_spent() {
        let policy = flat(3);
        let delays: Vec<Duration> = policy.backoff().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_millis(1000)
            ]
        );
    }

    #[test]
    fn delays_are_capped() {
        let policy = BrokerRetryPolicy {
            max_retries: 4,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 10.0,
            jitter_factor: 0.0,
        };
        assert_eq!(policy.base_delay(0), Duration::from_secs(1));
        assert_eq!(policy.base_delay(1), Duration::from_secs(5));
        assert_eq!(policy.base_delay(40), Duration::from_secs(5));
    }

    #[test]
    fn zero_retries_never_waits() {
        let policy = flat(0);
        let mut backoff = policy.backoff();
        assert!(backoff.next().is_none());
        assert_eq!(backoff.retries(), 0);
    }

    #[test]
    fn jitter_stays_in_band() {
        let policy = BrokerRetryPolicy::default();
        for _ in 0..100 {
            let delay = policy.backoff().next().unwrap_or_default();
            assert!(
                delay >= Duration::from_millis(200) && delay <= Duration::from_millis(300),
                "{delay:?} outside 200-300ms"
            );
        }
    }

    #[test_case(429 => HttpStatusClass::RateLimited)]
    #[test_case(408 => HttpStatusClass::Transient)]
    #[test_case(502 => HttpStatusClass::Transient)]
    #[test_case(400 => HttpStatusClass::Permanent)]
    #[test_case(401 => HttpStatusClass::Permanent)]
    fn status_classes(status: u16) -> HttpStatusClass {
        HttpStatusClass::of(status)
    }
}
