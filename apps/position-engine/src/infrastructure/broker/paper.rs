//! Paper broker.
//!
//! In-process `BrokerPort` for dry runs and tests. Market orders fill
//! immediately at the requested quantity; limit and stop orders rest until
//! [`PaperBroker::fill_order`] is called. Net holdings per symbol are kept
//! from fills so reconciliation sees a consistent account.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{BrokerError, BrokerPort, Holding};
use crate::domain::orders::{OrderRequest, OrderStatus, OrderStatusReport, OrderType};
use crate::domain::shared::{BrokerOrderId, Symbol};

/// How market orders complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarketFill {
    /// Fill the whole quantity.
    #[default]
    Full,
    /// Fill at most this many and report the order complete.
    Partial(u64),
    /// Never fill.
    Pending,
    /// Report the order rejected after acceptance.
    Reject,
}

#[derive(Debug, Clone)]
struct PaperOrder {
    request: OrderRequest,
    status: OrderStatus,
    filled_qty: u64,
    message: Option<String>,
}

#[derive(Debug, Default)]
struct PaperState {
    next_id: u64,
    orders: HashMap<BrokerOrderId, PaperOrder>,
    placed: Vec<BrokerOrderId>,
    cancelled: Vec<BrokerOrderId>,
    holdings: HashMap<Symbol, i64>,
    market_fill: MarketFill,
    placement_failures: Vec<(OrderType, BrokerError)>,
    cancel_failures: HashMap<BrokerOrderId, BrokerError>,
    status_failures: VecDeque<BrokerError>,
    holdings_failures: VecDeque<BrokerError>,
}

impl PaperState {
    fn apply_fill(&mut self, id: &BrokerOrderId, quantity: u64) {
        let Some(order) = self.orders.get_mut(id) else {
            return;
        };
        order.status = OrderStatus::Filled;
        order.filled_qty = quantity;
        let delta = order.request.side.sign() * i64::try_from(quantity).unwrap_or(i64::MAX);
        let symbol = order.request.symbol.clone();

        let held = self.holdings.entry(symbol.clone()).or_insert(0);
        *held += delta;
        if *held == 0 {
            self.holdings.remove(&symbol);
        }
    }
}

/// Simulated broker.
#[derive(Debug, Default)]
pub struct PaperBroker {
    state: Mutex<PaperState>,
}

impl PaperBroker {
    /// Create an empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how subsequent market orders complete.
    pub fn set_market_fill(&self, mode: MarketFill) {
        self.state.lock().market_fill = mode;
    }

    /// Fill a resting order. Returns `false` if it is unknown or not pending.
    pub fn fill_order(&self, order_id: &BrokerOrderId) -> bool {
        let mut state = self.state.lock();
        let quantity = match state.orders.get(order_id) {
            Some(order) if order.status == OrderStatus::Pending => order.request.quantity,
            _ => return false,
        };
        state.apply_fill(order_id, quantity);
        tracing::debug!(%order_id, quantity, "Paper order filled");
        true
    }

    /// Cancel or reject an order on the broker side, as an exchange or RMS would.
    pub fn expire_order(&self, order_id: &BrokerOrderId, status: OrderStatus) -> bool {
        let mut state = self.state.lock();
        match state.orders.get_mut(order_id) {
            Some(order) if order.status == OrderStatus::Pending => {
                order.status = status;
                order.message = Some("closed by exchange".to_string());
                true
            }
            _ => false,
        }
    }

    /// Override the net holding for `symbol`.
    pub fn set_holding(&self, symbol: &Symbol, quantity: i64) {
        let mut state = self.state.lock();
        if quantity == 0 {
            state.holdings.remove(symbol);
        } else {
            state.holdings.insert(symbol.clone(), quantity);
        }
    }

    /// Net holding for `symbol`.
    #[must_use]
    pub fn holding(&self, symbol: &Symbol) -> i64 {
        self.state.lock().holdings.get(symbol).copied().unwrap_or(0)
    }

    /// Fail the next placement of `order_type` with `error`.
    pub fn fail_next_placement(&self, order_type: OrderType, error: BrokerError) {
        self.state.lock().placement_failures.push((order_type, error));
    }

    /// Fail the next cancel of `order_id` with `error`.
    pub fn fail_cancel(&self, order_id: &BrokerOrderId, error: BrokerError) {
        self.state
            .lock()
            .cancel_failures
            .insert(order_id.clone(), error);
    }

    /// Fail the next status query.
    pub fn fail_next_status(&self, error: BrokerError) {
        self.state.lock().status_failures.push_back(error);
    }

    /// Fail the next holdings query.
    pub fn fail_next_holdings(&self, error: BrokerError) {
        self.state.lock().holdings_failures.push_back(error);
    }

    /// Accepted orders in placement order.
    #[must_use]
    pub fn placed_orders(&self) -> Vec<(BrokerOrderId, OrderRequest)> {
        let state = self.state.lock();
        state
            .placed
            .iter()
            .filter_map(|id| state.orders.get(id).map(|o| (id.clone(), o.request.clone())))
            .collect()
    }

    /// Orders cancelled through `cancel_order`.
    #[must_use]
    pub fn cancelled_orders(&self) -> Vec<BrokerOrderId> {
        self.state.lock().cancelled.clone()
    }

    /// Current status of an order.
    #[must_use]
    pub fn status_of(&self, order_id: &BrokerOrderId) -> Option<OrderStatus> {
        self.state.lock().orders.get(order_id).map(|o| o.status)
    }

    /// Pending orders for `symbol`.
    #[must_use]
    pub fn open_orders(&self, symbol: &Symbol) -> Vec<(BrokerOrderId, OrderRequest)> {
        self.placed_orders()
            .into_iter()
            .filter(|(id, request)| {
                &request.symbol == symbol && self.status_of(id) == Some(OrderStatus::Pending)
            })
            .collect()
    }
}

#[async_trait]
impl BrokerPort for PaperBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<BrokerOrderId, BrokerError> {
        request.validate().map_err(|e| BrokerError::OrderRejected {
            reason: e.to_string(),
        })?;

        let mut state = self.state.lock();
        if let Some(index) = state
            .placement_failures
            .iter()
            .position(|(order_type, _)| *order_type == request.order_type)
        {
            let (_, error) = state.placement_failures.remove(index);
            return Err(error);
        }

        state.next_id += 1;
        let id = BrokerOrderId::new(format!("PAPER-{:06}", state.next_id));
        state.orders.insert(
            id.clone(),
            PaperOrder {
                request: request.clone(),
                status: OrderStatus::Pending,
                filled_qty: 0,
                message: None,
            },
        );
        state.placed.push(id.clone());

        if request.order_type == OrderType::Market {
            let mode = state.market_fill;
            match mode {
                MarketFill::Full => state.apply_fill(&id, request.quantity),
                MarketFill::Partial(quantity) => {
                    state.apply_fill(&id, quantity.min(request.quantity));
                }
                MarketFill::Pending => {}
                MarketFill::Reject => {
                    if let Some(order) = state.orders.get_mut(&id) {
                        order.status = OrderStatus::Rejected;
                        order.message = Some("simulated rejection".to_string());
                    }
                }
            }
        }

        tracing::debug!(
            %id,
            symbol = %request.symbol,
            side = request.side.as_str(),
            order_type = %request.order_type,
            qty = request.quantity,
            "Paper order accepted"
        );
        Ok(id)
    }

    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError> {
        let mut state = self.state.lock();
        if let Some(error) = state.cancel_failures.remove(order_id) {
            return Err(error);
        }

        let order = state
            .orders
            .get_mut(order_id)
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if order.status != OrderStatus::Pending {
            return Err(BrokerError::OrderNotOpen {
                order_id: order_id.to_string(),
                reason: format!("order is {}", order.status),
            });
        }

        order.status = OrderStatus::Cancelled;
        state.cancelled.push(order_id.clone());
        Ok(())
    }

    async fn order_status(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<OrderStatusReport, BrokerError> {
        let mut state = self.state.lock();
        if let Some(error) = state.status_failures.pop_front() {
            return Err(error);
        }

        state
            .orders
            .get(order_id)
            .map(|order| OrderStatusReport {
                status: order.status,
                filled_qty: order.filled_qty,
                message: order.message.clone(),
            })
            .ok_or_else(|| BrokerError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        let mut state = self.state.lock();
        if let Some(error) = state.holdings_failures.pop_front() {
            return Err(error);
        }

        let mut holdings: Vec<Holding> = state
            .holdings
            .iter()
            .filter(|(_, quantity)| **quantity != 0)
            .map(|(symbol, quantity)| Holding {
                symbol: symbol.clone(),
                quantity: *quantity,
            })
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(holdings)
    }
}
