//! Child orders attached to a position.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::orders::OrderRequest;
use crate::domain::shared::BrokerOrderId;

/// Named slot a child order occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSlot {
    /// The filled market entry.
    Entry,
    /// Protective stop.
    StopLoss,
    /// Full target.
    TakeProfit,
    /// Half-size target.
    PartialTakeProfit,
}

impl ChildSlot {
    /// Slots holding resting exit orders, in cancellation order.
    pub const EXITS: [Self; 3] = [Self::StopLoss, Self::TakeProfit, Self::PartialTakeProfit];

    /// Label used in logs and notifications.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::PartialTakeProfit => "partial_take_profit",
        }
    }
}

impl fmt::Display for ChildSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order placed at the broker together with the request it was placed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOrder {
    /// Broker order id.
    pub order_id: BrokerOrderId,
    /// Request snapshot for identical re-submission.
    pub request: OrderRequest,
}

impl ChildOrder {
    /// Pair a broker id with its request.
    #[must_use]
    pub const fn new(order_id: BrokerOrderId, request: OrderRequest) -> Self {
        Self { order_id, request }
    }
}

/// Fixed set of child-order slots of one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildOrders {
    /// Entry order.
    #[serde(default)]
    pub entry: Option<ChildOrder>,
    /// Stop-loss order.
    #[serde(default)]
    pub stop_loss: Option<ChildOrder>,
    /// Take-profit order.
    #[serde(default)]
    pub take_profit: Option<ChildOrder>,
    /// Partial take-profit order.
    #[serde(default)]
    pub partial_take_profit: Option<ChildOrder>,
}

impl ChildOrders {
    /// Order in `slot`, if any.
    #[must_use]
    pub const fn get(&self, slot: ChildSlot) -> Option<&ChildOrder> {
        match slot {
            ChildSlot::Entry => self.entry.as_ref(),
            ChildSlot::StopLoss => self.stop_loss.as_ref(),
            ChildSlot::TakeProfit => self.take_profit.as_ref(),
            ChildSlot::PartialTakeProfit => self.partial_take_profit.as_ref(),
        }
    }

    /// Put `order` into `slot`, returning the previous occupant.
    pub fn set(&mut self, slot: ChildSlot, order: ChildOrder) -> Option<ChildOrder> {
        self.slot_mut(slot).replace(order)
    }

    /// Empty `slot`, returning its occupant.
    pub fn clear(&mut self, slot: ChildSlot) -> Option<ChildOrder> {
        self.slot_mut(slot).take()
    }

    fn slot_mut(&mut self, slot: ChildSlot) -> &mut Option<ChildOrder> {
        match slot {
            ChildSlot::Entry => &mut self.entry,
            ChildSlot::StopLoss => &mut self.stop_loss,
            ChildSlot::TakeProfit => &mut self.take_profit,
            ChildSlot::PartialTakeProfit => &mut self.partial_take_profit,
        }
    }
}
