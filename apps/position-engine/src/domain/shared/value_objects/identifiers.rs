//! Broker-side identifiers.
//!
//! Both are opaque strings issued by the broker; the newtypes keep an order
//! id from being passed where an instrument key is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id the broker assigned to an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrokerOrderId(String);

impl BrokerOrderId {
    /// Wrap a broker order id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The id as sent to the broker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BrokerOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BrokerOrderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Instrument a symbol resolves to, e.g. `NSE_EQ|INE002A01018`.
///
/// The part before `|` is the exchange segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentKey(String);

impl InstrumentKey {
    /// Wrap an instrument key. Case is kept as given.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key as sent to the broker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exchange segment (`NSE_EQ`), if the key carries one.
    #[must_use]
    pub fn segment(&self) -> Option<&str> {
        self.0.split_once('|').map(|(segment, _)| segment)
    }
}

impl fmt::Display for InstrumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_key_keeps_case_and_splits_segment() {
        let key = InstrumentKey::new("NSE_EQ|ine002a01018");
        assert_eq!(key.as_str(), "NSE_EQ|ine002a01018");
        assert_eq!(key.segment(), Some("NSE_EQ"));
        assert_eq!(InstrumentKey::new("INE002A01018").segment(), None);
    }

    #[test]
    fn order_ids_compare_by_value() {
        assert_eq!(BrokerOrderId::from("250101000001"), BrokerOrderId::new("250101000001"));
        assert_ne!(BrokerOrderId::from("1"), BrokerOrderId::from("2"));
    }

    #[test]
    fn serialized_as_plain_strings() {
        let json = serde_json::to_string(&BrokerOrderId::new("PAPER-000001")).unwrap();
        assert_eq!(json, "\"PAPER-000001\"");
    }
}
