//! Shared harness for the integration tests.
//!
//! Wires the orchestrator to the paper broker, an in-memory store, a
//! switchable calendar and a recording notifier.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use position_engine::application::dto::OpenPositionCommand;
use position_engine::application::ports::{
    BrokerError, BrokerPort, Holding, MarketCalendarPort, NotifierPort, PositionStorePort, SymbolResolverPort,
};
use position_engine::application::services::{OrchestratorConfig, PositionOrchestrator};
use position_engine::domain::orders::{OrderRequest, OrderStatusReport, OrderType};
use position_engine::domain::position_lifecycle::{ChildSlot, Direction, Position, ProtectionLevels};
use position_engine::domain::shared::{BrokerOrderId, Symbol};
use position_engine::infrastructure::broker::PaperBroker;
use position_engine::infrastructure::notifier::InMemoryNotifier;
use position_engine::infrastructure::persistence::InMemoryPositionStore;
use position_engine::infrastructure::resolver::StaticSymbolResolver;
use rust_decimal::Decimal;

/// Calendar whose answers are set by the test.
#[derive(Debug)]
pub struct TestCalendar {
    open: AtomicBool,
    after_close: AtomicBool,
}

impl TestCalendar {
    pub fn open() -> Self {
        Self {
            open: AtomicBool::new(true),
            after_close: AtomicBool::new(false),
        }
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    pub fn set_after_close(&self, after_close: bool) {
        self.after_close.store(after_close, Ordering::SeqCst);
    }
}

impl MarketCalendarPort for TestCalendar {
    fn is_session_open(&self, _now: DateTime<Utc>) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn session_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.date_naive()
    }

    fn is_after_close(&self, _now: DateTime<Utc>) -> bool {
        self.after_close.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub broker: Arc<PaperBroker>,
    pub store: Arc<InMemoryPositionStore>,
    pub calendar: Arc<TestCalendar>,
    pub notifier: Arc<InMemoryNotifier>,
    pub orchestrator: Arc<PositionOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(InMemoryPositionStore::new()))
    }

    pub fn with_store(store: Arc<InMemoryPositionStore>) -> Self {
        Self::build(store, |paper, _| paper as Arc<dyn BrokerPort>)
    }

    /// Harness whose orchestrator talks to `gateway(paper)` instead of the
    /// paper broker directly.
    pub fn with_gateway(gateway: impl FnOnce(Arc<PaperBroker>) -> Arc<dyn BrokerPort>) -> Self {
        Self::build(Arc::new(InMemoryPositionStore::new()), |paper, _| gateway(paper))
    }

    /// Like [`Harness::with_gateway`], with the gateway also seeing the
    /// recording notifier.
    pub fn with_observed_gateway(
        gateway: impl FnOnce(Arc<PaperBroker>, Arc<InMemoryNotifier>) -> Arc<dyn BrokerPort>,
    ) -> Self {
        Self::build(Arc::new(InMemoryPositionStore::new()), gateway)
    }

    fn build(
        store: Arc<InMemoryPositionStore>,
        gateway: impl FnOnce(Arc<PaperBroker>, Arc<InMemoryNotifier>) -> Arc<dyn BrokerPort>,
    ) -> Self {
        let broker = Arc::new(PaperBroker::new());
        let calendar = Arc::new(TestCalendar::open());
        let notifier = Arc::new(InMemoryNotifier::new());
        let resolver = Arc::new(StaticSymbolResolver::new(
            [
                ("RELIANCE", "NSE_EQ|INE002A01018"),
                ("INFY", "NSE_EQ|INE009A01021"),
                ("SBIN", "NSE_EQ|INE062A01020"),
            ],
            None,
        ));

        let orchestrator = Arc::new(PositionOrchestrator::new(
            OrchestratorConfig {
                fill_poll_interval: Duration::from_millis(5),
                fill_timeout: Duration::from_millis(60),
            },
            gateway(Arc::clone(&broker), Arc::clone(&notifier)),
            Arc::clone(&store) as Arc<dyn PositionStorePort>,
            Arc::clone(&calendar) as Arc<dyn MarketCalendarPort>,
            resolver as Arc<dyn SymbolResolverPort>,
            Arc::clone(&notifier) as Arc<dyn NotifierPort>,
        ));

        Self {
            broker,
            store,
            calendar,
            notifier,
            orchestrator,
        }
    }

    pub fn position(&self, symbol: &str) -> Position {
        self.orchestrator
            .position(&Symbol::new(symbol))
            .unwrap_or_else(|| panic!("{symbol} should be open"))
    }

    pub fn child_id(&self, symbol: &str, slot: ChildSlot) -> BrokerOrderId {
        self.position(symbol)
            .child(slot)
            .unwrap_or_else(|| panic!("{symbol} should have a {slot}"))
            .order_id
            .clone()
    }

    /// Orders of `order_type` accepted by the broker, in placement order.
    pub fn placed_of(&self, order_type: OrderType) -> Vec<OrderRequest> {
        self.broker
            .placed_orders()
            .into_iter()
            .filter(|(_, request)| request.order_type == order_type)
            .map(|(_, request)| request)
            .collect()
    }
}

pub fn levels(sl: Option<Decimal>, tp: Option<Decimal>, partial: Option<Decimal>) -> ProtectionLevels {
    ProtectionLevels {
        stop_loss: sl,
        take_profit: tp,
        partial_take_profit: partial,
    }
}

pub fn command(
    symbol: &str,
    direction: Direction,
    quantity: u64,
    levels: ProtectionLevels,
) -> OpenPositionCommand {
    OpenPositionCommand {
        symbol: Symbol::new(symbol),
        direction,
        quantity,
        levels,
    }
}

/// Rejects every market order after the first `allowed`.
pub struct MarketCutoff {
    inner: Arc<PaperBroker>,
    allowed: usize,
    seen: AtomicUsize,
}

impl MarketCutoff {
    pub fn new(inner: Arc<PaperBroker>, allowed: usize) -> Self {
        Self {
            inner,
            allowed,
            seen: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BrokerPort for MarketCutoff {
    async fn place_order(&self, request: &OrderRequest) -> Result<BrokerOrderId, BrokerError> {
        if request.order_type == OrderType::Market
            && self.seen.fetch_add(1, Ordering::SeqCst) >= self.allowed
        {
            return Err(BrokerError::OrderRejected {
                reason: "market orders blocked".to_string(),
            });
        }
        self.inner.place_order(request).await
    }

    async fn cancel_order(&self, order_id: &BrokerOrderId) -> Result<(), BrokerError> {
        self.inner.cancel_order(order_id).await
    }

    async fn order_status(&self, order_id: &BrokerOrderId) -> Result<OrderStatusReport, BrokerError> {
        self.inner.order_status(order_id).await
    }

    async fn list_holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        self.inner.list_holdings().await
    }
}
