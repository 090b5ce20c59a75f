//! Position Lifecycle Orchestrator
//!
//! Owns the symbol-keyed book of open positions and every mutation of it.
//!
//! # Open sequence
//!
//! 1. Reverse any existing position for the symbol (cancel exits, market exit,
//!    remove).
//! 2. Place the market entry.
//! 3. Poll the entry until filled, rejected or the fill timeout elapses.
//! 4. Size the legs from the filled quantity ([`LegPlan`]).
//! 5. Place the partial take-profit and take-profit limits (failures degrade).
//! 6. Place the stop-loss; if it fails, cancel the targets and flatten.
//! 7. Persist and notify.
//!
//! Mutations are serialized per symbol through [`SymbolLocks`]. The book's
//! lock is never held across a broker or store call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::application::dto::{
    AdjustOutcome, ChildOrderIds, CloseAllOutcome, ClosePositionOutcome, FailedClose,
    OpenPositionCommand, OpenPositionOutcome, OpenStatus, ReversalSummary,
};
use crate::application::ports::{
    BrokerError, BrokerPort, MarketCalendarPort, NotifierPort, PositionStorePort,
    SymbolResolverPort,
};
use crate::domain::orders::{OrderRequest, OrderStatus};
use crate::domain::position_lifecycle::{
    ChildOrder, ChildSlot, CloseReason, LegPlan, Position, ProtectionLevels,
};
use crate::domain::shared::{BrokerOrderId, Symbol};
use crate::error::OrchestratorError;
use crate::observability;

use super::notifications;
use super::session_stats::SessionStats;
use super::symbol_locks::SymbolLocks;

/// Orchestrator timing settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Interval between entry status polls.
    pub fill_poll_interval: Duration,
    /// How long to wait for an entry fill.
    pub fill_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fill_poll_interval: Duration::from_secs(1),
            fill_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of re-arming a cancelled child order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result")]
pub enum RearmOutcome {
    /// Recreated from its snapshot under a new id.
    Rearmed {
        /// New broker order id.
        order_id: BrokerOrderId,
    },
    /// A target could not be recreated; the slot was emptied.
    Dropped,
    /// The stop could not be recreated; the position was closed at market.
    Flattened,
    /// Nothing to do (session closed, slot changed, position gone).
    Skipped,
}

/// Result of booking a filled take-profit or stop-loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitCompletion {
    /// Nothing is held any more; the position was removed.
    Closed(ClosePositionOutcome),
    /// The take-profit filled while the partial leg was still working; the
    /// stop now covers `remaining_qty`.
    Reduced {
        /// Quantity still held.
        remaining_qty: u64,
    },
    /// The stop could not be resized; the remainder was closed at market.
    Flattened,
    /// The slot no longer holds the order (the position changed since the
    /// scan read it).
    Skipped,
}

/// What a cancel left behind at the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CancelConfirmation {
    /// Cancelled or rejected; nothing rests.
    Inactive,
    /// Filled before the cancel landed.
    Filled,
}

/// Result of replacing the stop after part of the position exited.
#[derive(Debug)]
enum StopResize {
    /// The stop covers the outstanding quantity. Not yet persisted.
    Resized(Position),
    /// The stale stop filled first; the position was removed.
    StopFilled(ClosePositionOutcome),
    /// The replacement stop failed; the remainder was closed at market.
    Flattened,
}

/// Outcome of cancelling a position's resting exits.
#[derive(Debug, Default)]
struct CancelSweep {
    cancelled: Vec<(ChildSlot, ChildOrder)>,
    failures: Vec<String>,
    filled: Vec<ChildSlot>,
}

impl CancelSweep {
    fn cancelled_ids(&self) -> Vec<String> {
        self.cancelled
            .iter()
            .map(|(_, child)| child.order_id.to_string())
            .collect()
    }
}

/// Places, verifies, adjusts and tears down the orders of each position.
pub struct PositionOrchestrator {
    config: OrchestratorConfig,
    broker: Arc<dyn BrokerPort>,
    store: Arc<dyn PositionStorePort>,
    calendar: Arc<dyn MarketCalendarPort>,
    resolver: Arc<dyn SymbolResolverPort>,
    notifier: Arc<dyn NotifierPort>,
    book: RwLock<HashMap<Symbol, Position>>,
    locks: SymbolLocks,
    stats: SessionStats,
}

impl std::fmt::Debug for PositionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionOrchestrator")
            .field("config", &self.config)
            .field("open_positions", &self.book.read().len())
            .finish_non_exhaustive()
    }
}

impl PositionOrchestrator {
    /// Create an orchestrator with an empty book.
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        broker: Arc<dyn BrokerPort>,
        store: Arc<dyn PositionStorePort>,
        calendar: Arc<dyn MarketCalendarPort>,
        resolver: Arc<dyn SymbolResolverPort>,
        notifier: Arc<dyn NotifierPort>,
    ) -> Self {
        Self {
            config,
            broker,
            store,
            calendar,
            resolver,
            notifier,
            book: RwLock::new(HashMap::new()),
            locks: SymbolLocks::new(),
            stats: SessionStats::new(),
        }
    }

    /// Broker gateway (with retry).
    #[must_use]
    pub fn broker(&self) -> &Arc<dyn BrokerPort> {
        &self.broker
    }

    /// Market calendar.
    #[must_use]
    pub fn calendar(&self) -> &Arc<dyn MarketCalendarPort> {
        &self.calendar
    }

    /// Operator notifier.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn NotifierPort> {
        &self.notifier
    }

    /// Session statistics.
    #[must_use]
    pub const fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Load persisted positions into the book.
    ///
    /// Must run before the monitor and reconciler start.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read.
    pub async fn restore(&self) -> Result<usize, OrchestratorError> {
        let positions = self.store.load().await?;
        let count = positions.len();
        {
            let mut book = self.book.write();
            for position in positions {
                if let Err(violation) = position.check_invariants() {
                    tracing::warn!(symbol = %position.symbol, %violation, "Restored position violates invariants");
                }
                book.insert(position.symbol.clone(), position);
            }
            observability::update_open_positions(book.len());
        }
        tracing::info!(count, "Restored positions from store");
        Ok(count)
    }

    /// Tell the operator the engine is up, listing restored positions.
    pub async fn announce_startup(&self, mode: &str) {
        let positions = self.positions();
        self.notifier
            .notify(&notifications::startup(&positions, mode))
            .await;
    }

    /// Snapshot of every open position, ordered by symbol.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        let mut positions: Vec<Position> = self.book.read().values().cloned().collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        positions
    }

    /// Snapshot of one position.
    #[must_use]
    pub fn position(&self, symbol: &Symbol) -> Option<Position> {
        self.book.read().get(symbol).cloned()
    }

    // ========================================================================
    // open_position
    // ========================================================================

    /// Open a position for a signal, reversing any existing one first.
    ///
    /// # Errors
    ///
    /// - `InvalidSignal` for a malformed command
    /// - `SessionClosed` outside trading hours
    /// - `UnknownSymbol` when the symbol has no instrument
    /// - `ReversalExitFailed` when the existing position could not be exited
    /// - `EntryRejected` / `EntryFillTimeout` when the entry did not fill
    /// - `ProtectionPlacementFailed` when neither the stop nor the emergency
    ///   exit could be placed
    pub async fn open_position(
        &self,
        command: OpenPositionCommand,
    ) -> Result<OpenPositionOutcome, OrchestratorError> {
        command.validate()?;
        let symbol = command.symbol.clone();

        if !self.calendar.is_session_open(Utc::now()) {
            return Err(OrchestratorError::SessionClosed {
                symbol: symbol.to_string(),
            });
        }
        let instrument =
            self.resolver
                .resolve(&symbol)
                .ok_or_else(|| OrchestratorError::UnknownSymbol {
                    symbol: symbol.to_string(),
                })?;

        let _guard = self.locks.acquire(&symbol).await;

        let reversal = match self.position(&symbol) {
            Some(existing) => Some(self.reverse_locked(existing).await?),
            None => None,
        };

        let entry_request = OrderRequest::market(
            symbol.clone(),
            instrument,
            command.direction.entry_side(),
            command.quantity,
        );
        let entry_id = match self.broker.place_order(&entry_request).await {
            Ok(id) => id,
            Err(BrokerError::OrderRejected { reason }) => {
                return Err(OrchestratorError::EntryRejected {
                    symbol: symbol.to_string(),
                    reason,
                });
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(%symbol, order_id = %entry_id, qty = command.quantity, direction = %command.direction, "Entry placed");

        let filled_qty = self
            .verify_fill(&symbol, &entry_id, command.quantity)
            .await?;

        let mut position = Position::open(
            ChildOrder::new(entry_id, entry_request),
            command.direction,
            command.quantity,
            filled_qty,
        )?;
        let mut warnings = Vec::new();
        self.place_targets(&mut position, &command.levels, &mut warnings)
            .await;

        let status = match command.levels.stop_loss {
            Some(trigger) => {
                match self
                    .place_stop(&mut position, trigger, &mut warnings)
                    .await
                {
                    Ok(()) => None,
                    Err(stop_error) => Some(
                        self.flatten_unprotected(position.clone(), &stop_error, &mut warnings)
                            .await?,
                    ),
                }
            }
            None => {
                tracing::warn!(%symbol, "Signal carried no stop-loss price; position is unprotected");
                warnings.push("no stop-loss price given; position has no stop".to_string());
                None
            }
        };

        let status = status.unwrap_or(if warnings.is_empty() {
            OpenStatus::Open
        } else {
            OpenStatus::Degraded
        });

        if status != OpenStatus::Flattened {
            if let Err(violation) = position.check_invariants() {
                tracing::error!(%symbol, %violation, "Opened position violates invariants");
            }
            self.persist(&position).await;
        }

        let child_order_ids = if status == OpenStatus::Flattened {
            ChildOrderIds {
                entry: position.child(ChildSlot::Entry).map(|c| c.order_id.to_string()),
                ..ChildOrderIds::default()
            }
        } else {
            ChildOrderIds::from(&position.child_orders)
        };

        let outcome = OpenPositionOutcome {
            symbol: symbol.to_string(),
            status,
            direction: command.direction,
            requested_qty: command.quantity,
            filled_qty,
            child_order_ids,
            reversal,
            warnings,
        };

        self.stats.record_open(status);
        observability::record_position_opened(match status {
            OpenStatus::Open => "open",
            OpenStatus::Degraded => "degraded",
            OpenStatus::Flattened => "flattened",
        });
        tracing::info!(%symbol, ?status, filled_qty, "open_position complete");
        self.notifier
            .notify(&notifications::position_opened(&outcome, &command.levels))
            .await;

        Ok(outcome)
    }

    async fn reverse_locked(
        &self,
        existing: Position,
    ) -> Result<ReversalSummary, OrchestratorError> {
        let symbol = existing.symbol.clone();
        let previous_direction = existing.direction;
        tracing::info!(%symbol, direction = %previous_direction, "Reversing existing position");

        match self.close_locked(existing, CloseReason::Reversal).await {
            Ok(closed) => Ok(ReversalSummary {
                previous_direction,
                exit_qty: closed.exit_qty,
                exit_order_id: closed.exit_order_id.unwrap_or_default(),
            }),
            Err(OrchestratorError::ExitOrderFailed { symbol, reason }) => {
                Err(OrchestratorError::ReversalExitFailed { symbol, reason })
            }
            Err(e) => Err(e),
        }
    }

    async fn verify_fill(
        &self,
        symbol: &Symbol,
        order_id: &BrokerOrderId,
        requested_qty: u64,
    ) -> Result<u64, OrchestratorError> {
        let started = Instant::now();
        let deadline = started + self.config.fill_timeout;

        loop {
            match self.broker.order_status(order_id).await {
                Ok(report) => match report.status {
                    OrderStatus::Filled if report.filled_qty == 0 => {
                        tracing::warn!(%symbol, %order_id, "Entry reported filled without a quantity; polling again");
                    }
                    OrderStatus::Filled => {
                        let filled = report.filled_qty;
                        if filled < requested_qty {
                            tracing::warn!(%symbol, %order_id, filled, requested_qty, "Entry partially filled");
                        }
                        return Ok(filled);
                    }
                    OrderStatus::Rejected | OrderStatus::Cancelled => {
                        let reason = report
                            .message
                            .unwrap_or_else(|| report.status.to_string());
                        tracing::warn!(%symbol, %order_id, %reason, "Entry not filled");
                        return Err(OrchestratorError::EntryRejected {
                            symbol: symbol.to_string(),
                            reason,
                        });
                    }
                    OrderStatus::Pending => {}
                },
                Err(e) => {
                    tracing::warn!(%symbol, %order_id, error = %e, "Entry status check failed");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                let waited_ms = u64::try_from(now.duration_since(started).as_millis())
                    .unwrap_or(u64::MAX);
                tracing::error!(%symbol, %order_id, waited_ms, "Entry fill not confirmed; leaving order for manual attention");
                self.notifier
                    .notify(&notifications::entry_timeout(symbol, order_id, waited_ms))
                    .await;
                return Err(OrchestratorError::EntryFillTimeout {
                    symbol: symbol.to_string(),
                    order_id: order_id.to_string(),
                    waited_ms,
                });
            }
            tokio::time::sleep(self.config.fill_poll_interval.min(deadline - now)).await;
        }
    }

    /// Steps 4-5: partial take-profit then take-profit, each independently.
    async fn place_targets(
        &self,
        position: &mut Position,
        levels: &ProtectionLevels,
        warnings: &mut Vec<String>,
    ) {
        let plan = LegPlan::derive(
            position.filled_qty,
            levels.partial_take_profit.is_some(),
            levels.take_profit.is_some(),
        );

        if let Some(price) = levels.partial_take_profit
            && plan.partial_qty > 0
        {
            let request = limit_exit(position, plan.partial_qty, price);
            match self.broker.place_order(&request).await {
                Ok(id) => {
                    tracing::info!(symbol = %position.symbol, order_id = %id, qty = plan.partial_qty, %price, "Partial take-profit placed");
                    position
                        .child_orders
                        .set(ChildSlot::PartialTakeProfit, ChildOrder::new(id, request));
                }
                Err(e) => {
                    tracing::warn!(symbol = %position.symbol, error = %e, "Partial take-profit placement failed");
                    warnings.push(format!("partial take-profit not placed: {e}"));
                }
            }
        }

        if let Some(price) = levels.take_profit
            && plan.take_profit_qty > 0
        {
            // Without a resting partial leg the target covers the whole fill.
            let qty = position.filled_qty - position.partial_qty();
            let request = limit_exit(position, qty, price);
            match self.broker.place_order(&request).await {
                Ok(id) => {
                    tracing::info!(symbol = %position.symbol, order_id = %id, qty, %price, "Take-profit placed");
                    position
                        .child_orders
                        .set(ChildSlot::TakeProfit, ChildOrder::new(id, request));
                }
                Err(e) => {
                    tracing::warn!(symbol = %position.symbol, error = %e, "Take-profit placement failed");
                    warnings.push(format!("take-profit not placed: {e}"));
                }
            }
        }
    }

    /// Step 6: stop-loss for the whole filled quantity.
    async fn place_stop(
        &self,
        position: &mut Position,
        trigger: rust_decimal::Decimal,
        warnings: &mut Vec<String>,
    ) -> Result<(), BrokerError> {
        let request = OrderRequest::stop_market(
            position.symbol.clone(),
            position.instrument.clone(),
            position.direction.exit_side(),
            position.filled_qty,
            trigger,
        );
        match self.broker.place_order(&request).await {
            Ok(id) => {
                tracing::info!(symbol = %position.symbol, order_id = %id, qty = position.filled_qty, %trigger, "Stop-loss placed");
                position
                    .child_orders
                    .set(ChildSlot::StopLoss, ChildOrder::new(id, request));
                Ok(())
            }
            Err(e) => {
                tracing::error!(symbol = %position.symbol, error = %e, "Stop-loss placement failed");
                warnings.push(format!("stop-loss not placed: {e}"));
                Err(e)
            }
        }
    }

    /// Cancel the targets and close the fill at market after a stop failure.
    ///
    /// Returns `Flattened` on success. When the exit also fails the position
    /// is kept (without a stop) and `ProtectionPlacementFailed` is returned.
    async fn flatten_unprotected(
        &self,
        mut position: Position,
        stop_error: &BrokerError,
        warnings: &mut Vec<String>,
    ) -> Result<OpenStatus, OrchestratorError> {
        let sweep = self.cancel_exits(&position, None).await;
        warnings.extend(sweep.failures.iter().cloned());
        for (slot, _) in &sweep.cancelled {
            position.child_orders.clear(*slot);
        }

        let qty = position.filled_qty;
        match self.emergency_exit(&position, qty).await {
            Ok(exit_id) => {
                warnings.push(format!("flattened {qty} with market order {exit_id}"));
                self.notifier
                    .notify(&notifications::emergency_exit(
                        &position.symbol,
                        qty,
                        &stop_error.to_string(),
                    ))
                    .await;
                Ok(OpenStatus::Flattened)
            }
            Err(exit_error) => {
                let reason = format!("stop-loss: {stop_error}; emergency exit: {exit_error}");
                tracing::error!(symbol = %position.symbol, %reason, "Position left without protection");
                self.persist(&position).await;
                self.stats.record_open(OpenStatus::Degraded);
                self.notifier
                    .notify(&notifications::protection_failed(&position.symbol, &reason))
                    .await;
                Err(OrchestratorError::ProtectionPlacementFailed {
                    symbol: position.symbol.to_string(),
                    reason,
                })
            }
        }
    }

    // ========================================================================
    // adjust_on_partial_fill
    // ========================================================================

    /// Resize the stop after the partial take-profit filled.
    ///
    /// The old stop is cancelled first; if that cancel cannot be confirmed
    /// the position is left untouched so the next monitor scan retries. When
    /// the take-profit already filled, the partial exits the remainder and
    /// the position is closed.
    ///
    /// # Errors
    ///
    /// - `PositionNotFound` if the symbol is not tracked
    /// - `Broker` if the stale stop could not be confirmed cancelled
    /// - `ProtectionPlacementFailed` if neither the new stop nor the
    ///   emergency exit could be placed
    pub async fn adjust_on_partial_fill(
        &self,
        symbol: &Symbol,
    ) -> Result<AdjustOutcome, OrchestratorError> {
        let _guard = self.locks.acquire(symbol).await;
        let mut position = self.require(symbol)?;

        if position.partial_filled {
            return Ok(adjusted(&position));
        }
        position.partial_filled = true;
        let remaining = position.outstanding_qty();

        if remaining == 0 {
            tracing::info!(%symbol, "Partial take-profit exited the remainder");
            self.stats.record_partial_fill();
            self.finish_locked(
                position,
                ChildSlot::PartialTakeProfit,
                CloseReason::TakeProfitHit,
            )
            .await;
            return Ok(closed_adjustment(symbol));
        }

        match self.resize_stop_locked(position).await? {
            StopResize::Resized(position) => {
                self.stats.record_partial_fill();
                self.persist(&position).await;
                if let Some(stop) = position.child(ChildSlot::StopLoss) {
                    tracing::info!(%symbol, order_id = %stop.order_id, qty = remaining, "Stop-loss resized after partial fill");
                    self.notifier
                        .notify(&notifications::partial_adjusted(
                            symbol,
                            remaining,
                            &stop.order_id,
                        ))
                        .await;
                }
                Ok(adjusted(&position))
            }
            StopResize::StopFilled(_) => Ok(closed_adjustment(symbol)),
            StopResize::Flattened => {
                self.stats.record_partial_fill();
                Ok(closed_adjustment(symbol))
            }
        }
    }

    // ========================================================================
    // close_position / close_all
    // ========================================================================

    /// Cancel every resting exit and flatten the outstanding quantity.
    ///
    /// # Errors
    ///
    /// - `PositionNotFound` if the symbol is not tracked
    /// - `ExitOrderFailed` if the market exit could not be placed; the
    ///   position stays tracked and its cancelled exits are re-armed
    pub async fn close_position(
        &self,
        symbol: &Symbol,
        reason: CloseReason,
    ) -> Result<ClosePositionOutcome, OrchestratorError> {
        let _guard = self.locks.acquire(symbol).await;
        let position = self.require(symbol)?;
        self.close_locked(position, reason).await
    }

    /// Close every open position.
    pub async fn close_all(&self) -> CloseAllOutcome {
        let mut outcome = CloseAllOutcome::default();
        for position in self.positions() {
            match self
                .close_position(&position.symbol, CloseReason::Manual)
                .await
            {
                Ok(closed) => outcome.closed_symbols.push(closed.symbol),
                Err(OrchestratorError::PositionNotFound { .. }) => {}
                Err(e) => outcome.failed_symbols.push(FailedClose {
                    symbol: position.symbol.to_string(),
                    code: e.code().reason().to_string(),
                    message: e.to_string(),
                }),
            }
        }
        tracing::info!(
            closed = outcome.closed_symbols.len(),
            failed = outcome.failed_symbols.len(),
            "close_all complete"
        );
        outcome
    }

    async fn close_locked(
        &self,
        mut position: Position,
        reason: CloseReason,
    ) -> Result<ClosePositionOutcome, OrchestratorError> {
        let symbol = position.symbol.clone();
        let sweep = self.cancel_exits(&position, None).await;

        // A stop that filled before we could cancel it already flattened the
        // position; filled targets only reduce what is left.
        if sweep.filled.contains(&ChildSlot::StopLoss) {
            tracing::info!(%symbol, "Stop-loss already filled at broker; no market order needed");
            return Ok(self
                .close_filled_locked(&symbol, CloseReason::StopLossHit, sweep)
                .await);
        }
        for slot in &sweep.filled {
            match slot {
                ChildSlot::PartialTakeProfit => position.partial_filled = true,
                ChildSlot::TakeProfit => position.record_target_fill(),
                _ => {}
            }
        }

        let qty = position.outstanding_qty();
        if qty == 0 {
            tracing::info!(%symbol, "Targets already filled at broker; no market order needed");
            return Ok(self
                .close_filled_locked(&symbol, CloseReason::TakeProfitHit, sweep)
                .await);
        }

        match self.broker.place_order(&position.exit_request(qty)).await {
            Ok(exit_id) => {
                tracing::info!(%symbol, order_id = %exit_id, qty, %reason, "Position closed at market");
                let outcome = ClosePositionOutcome {
                    symbol: symbol.to_string(),
                    reason,
                    exit_qty: qty,
                    exit_order_id: Some(exit_id.to_string()),
                    cancelled_orders: sweep.cancelled_ids(),
                    cancel_failures: sweep.failures,
                };
                self.remove_locked(&symbol, reason).await;
                self.notify_cancel_failures(&symbol, &outcome.cancel_failures)
                    .await;
                self.notifier
                    .notify(&notifications::position_closed(
                        &symbol,
                        reason,
                        qty,
                        Some(&exit_id),
                    ))
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(%symbol, error = %e, "Exit order failed; restoring cancelled exits");
                for (slot, child) in sweep.cancelled {
                    match self.broker.place_order(&child.request).await {
                        Ok(id) => {
                            position
                                .child_orders
                                .set(slot, ChildOrder::new(id, child.request));
                        }
                        Err(rearm_error) => {
                            tracing::error!(%symbol, %slot, error = %rearm_error, "Could not restore exit order");
                            position.child_orders.clear(slot);
                        }
                    }
                }
                self.persist(&position).await;
                let reason_text = e.to_string();
                self.notify_cancel_failures(&symbol, &sweep.failures).await;
                self.notifier
                    .notify(&notifications::exit_failed(&symbol, &reason_text))
                    .await;
                Err(OrchestratorError::ExitOrderFailed {
                    symbol: symbol.to_string(),
                    reason: reason_text,
                })
            }
        }
    }

    /// Remove a position whose exits filled at the broker during a close.
    async fn close_filled_locked(
        &self,
        symbol: &Symbol,
        reason: CloseReason,
        sweep: CancelSweep,
    ) -> ClosePositionOutcome {
        let outcome = ClosePositionOutcome {
            symbol: symbol.to_string(),
            reason,
            exit_qty: 0,
            exit_order_id: None,
            cancelled_orders: sweep.cancelled_ids(),
            cancel_failures: sweep.failures,
        };
        self.remove_locked(symbol, reason).await;
        self.notify_cancel_failures(symbol, &outcome.cancel_failures)
            .await;
        self.notifier
            .notify(&notifications::position_closed(symbol, reason, 0, None))
            .await;
        outcome
    }

    // ========================================================================
    // Monitor and reconciler entry points
    // ========================================================================

    /// Book a filled take-profit or stop-loss.
    ///
    /// A stop fill, or a take-profit fill that leaves nothing held, cancels
    /// the opposing exits and removes the position without a market order.
    /// A take-profit that filled while the partial leg is still working only
    /// reduces the position: the stop is resized to the remainder and the
    /// partial keeps resting.
    ///
    /// # Errors
    ///
    /// - `Broker` if the partial leg's status or the stale stop's cancel
    ///   could not be confirmed; the position is left for the next scan
    /// - `ProtectionPlacementFailed` if neither the resized stop nor the
    ///   emergency exit could be placed
    pub async fn complete_exit(
        &self,
        symbol: &Symbol,
        slot: ChildSlot,
        order_id: &BrokerOrderId,
    ) -> Result<ExitCompletion, OrchestratorError> {
        let _guard = self.locks.acquire(symbol).await;
        let Some(mut position) = self.position(symbol) else {
            return Ok(ExitCompletion::Skipped);
        };
        if position.child(slot).map(|c| &c.order_id) != Some(order_id) {
            return Ok(ExitCompletion::Skipped);
        }

        if slot == ChildSlot::StopLoss {
            let outcome = self
                .finish_locked(position, slot, CloseReason::StopLossHit)
                .await;
            return Ok(ExitCompletion::Closed(outcome));
        }

        let working_partial = position
            .resting_exits()
            .into_iter()
            .find(|(slot, _)| *slot == ChildSlot::PartialTakeProfit)
            .map(|(_, child)| child.order_id.clone());
        let mut partial_filled_now = false;
        if let Some(partial_id) = working_partial {
            let report = self.broker.order_status(&partial_id).await?;
            if report.status == OrderStatus::Filled {
                position.partial_filled = true;
                partial_filled_now = true;
            }
        }

        let remaining = position.residual_after_target();
        if remaining == 0 {
            if partial_filled_now {
                self.stats.record_partial_fill();
            }
            let outcome = self
                .finish_locked(position, slot, CloseReason::TakeProfitHit)
                .await;
            return Ok(ExitCompletion::Closed(outcome));
        }

        tracing::info!(%symbol, order_id = %order_id, remaining, "Take-profit filled ahead of the partial leg");
        position.record_target_fill();
        match self.resize_stop_locked(position).await? {
            StopResize::Resized(position) => {
                self.persist(&position).await;
                self.notifier
                    .notify(&notifications::target_reduced(symbol, remaining))
                    .await;
                Ok(ExitCompletion::Reduced {
                    remaining_qty: remaining,
                })
            }
            StopResize::StopFilled(outcome) => Ok(ExitCompletion::Closed(outcome)),
            StopResize::Flattened => Ok(ExitCompletion::Flattened),
        }
    }

    async fn finish_locked(
        &self,
        position: Position,
        filled_slot: ChildSlot,
        reason: CloseReason,
    ) -> ClosePositionOutcome {
        let symbol = position.symbol.clone();
        let sweep = self.cancel_exits(&position, Some(filled_slot)).await;
        tracing::info!(%symbol, slot = %filled_slot, %reason, "Exit filled; position removed");
        self.close_filled_locked(&symbol, reason, sweep).await
    }

    /// Replace the stop with one covering the position's outstanding quantity.
    ///
    /// `position` must already account for the exited quantity. Nothing is
    /// written when the stale stop cannot be confirmed cancelled.
    async fn resize_stop_locked(
        &self,
        mut position: Position,
    ) -> Result<StopResize, OrchestratorError> {
        let symbol = position.symbol.clone();
        let Some(stale_stop) = position.child(ChildSlot::StopLoss).cloned() else {
            return Ok(StopResize::Resized(position));
        };

        match self.confirm_cancel(&stale_stop.order_id).await {
            Ok(CancelConfirmation::Inactive) => {
                tracing::info!(%symbol, order_id = %stale_stop.order_id, "Stale stop-loss cancelled");
            }
            Ok(CancelConfirmation::Filled) => {
                tracing::warn!(%symbol, order_id = %stale_stop.order_id, "Stop-loss filled before it could be resized");
                let outcome = self
                    .finish_locked(position, ChildSlot::StopLoss, CloseReason::StopLossHit)
                    .await;
                return Ok(StopResize::StopFilled(outcome));
            }
            Err(e) => {
                tracing::warn!(%symbol, order_id = %stale_stop.order_id, error = %e, "Could not cancel stale stop-loss; will retry");
                return Err(e.into());
            }
        }

        position.child_orders.clear(ChildSlot::StopLoss);
        let qty = position.outstanding_qty();
        let request = stale_stop.request.with_quantity(qty);
        match self.broker.place_order(&request).await {
            Ok(id) => {
                position
                    .child_orders
                    .set(ChildSlot::StopLoss, ChildOrder::new(id, request));
                Ok(StopResize::Resized(position))
            }
            Err(stop_error) => {
                tracing::error!(%symbol, error = %stop_error, "Replacement stop-loss failed");
                self.emergency_close_locked(position, &stop_error).await?;
                Ok(StopResize::Flattened)
            }
        }
    }

    /// Recreate a resting exit the broker reports cancelled or rejected.
    ///
    /// Only runs while the session is open. A stop that cannot be recreated
    /// triggers an emergency exit.
    ///
    /// # Errors
    ///
    /// Returns `ProtectionPlacementFailed` when the stop and the emergency
    /// exit both fail.
    pub async fn rearm_slot(
        &self,
        symbol: &Symbol,
        slot: ChildSlot,
        stale_id: &BrokerOrderId,
    ) -> Result<RearmOutcome, OrchestratorError> {
        if !self.calendar.is_session_open(Utc::now()) {
            return Ok(RearmOutcome::Skipped);
        }
        let _guard = self.locks.acquire(symbol).await;
        let Some(mut position) = self.position(symbol) else {
            return Ok(RearmOutcome::Skipped);
        };
        let Some(stale) = position.child(slot).cloned() else {
            return Ok(RearmOutcome::Skipped);
        };
        if &stale.order_id != stale_id {
            return Ok(RearmOutcome::Skipped);
        }

        match self.broker.place_order(&stale.request).await {
            Ok(id) => {
                tracing::info!(%symbol, %slot, old_order_id = %stale_id, order_id = %id, "Exit order re-armed");
                position
                    .child_orders
                    .set(slot, ChildOrder::new(id.clone(), stale.request));
                self.persist(&position).await;
                observability::record_rearm(slot.as_str());
                self.notifier
                    .notify(&notifications::rearmed(symbol, slot, &id))
                    .await;
                Ok(RearmOutcome::Rearmed { order_id: id })
            }
            Err(e) if slot == ChildSlot::StopLoss => {
                tracing::error!(%symbol, error = %e, "Stop-loss could not be re-armed");
                position.child_orders.clear(slot);
                self.emergency_close_locked(position, &e).await?;
                Ok(RearmOutcome::Flattened)
            }
            Err(e) => {
                tracing::warn!(%symbol, %slot, error = %e, "Target could not be re-armed; dropping slot");
                position.child_orders.clear(slot);
                self.persist(&position).await;
                self.notifier
                    .notify(&notifications::rearm_failed(symbol, slot, &e.to_string()))
                    .await;
                Ok(RearmOutcome::Dropped)
            }
        }
    }

    /// Drop a ghost position without touching the broker.
    ///
    /// Skips the removal when the position was replaced (different
    /// `created_at`) since the caller read it.
    pub async fn forget(&self, symbol: &Symbol, created_at: DateTime<Utc>) -> Option<Position> {
        let _guard = self.locks.acquire(symbol).await;
        let position = self.position(symbol)?;
        if position.created_at != created_at {
            return None;
        }
        {
            let mut book = self.book.write();
            book.remove(symbol);
            observability::update_open_positions(book.len());
        }
        self.delete_persisted(symbol).await;
        Some(position)
    }

    // ========================================================================
    // Helpers (callers hold the symbol lock)
    // ========================================================================

    fn require(&self, symbol: &Symbol) -> Result<Position, OrchestratorError> {
        self.position(symbol)
            .ok_or_else(|| OrchestratorError::PositionNotFound {
                symbol: symbol.to_string(),
            })
    }

    async fn cancel_exits(&self, position: &Position, skip: Option<ChildSlot>) -> CancelSweep {
        let mut sweep = CancelSweep::default();
        for (slot, child) in position.resting_exits() {
            if Some(slot) == skip {
                continue;
            }
            match self.confirm_cancel(&child.order_id).await {
                Ok(CancelConfirmation::Inactive) => {
                    tracing::debug!(symbol = %position.symbol, %slot, order_id = %child.order_id, "Exit cancelled");
                    sweep.cancelled.push((slot, child.clone()));
                }
                Ok(CancelConfirmation::Filled) => {
                    tracing::info!(symbol = %position.symbol, %slot, order_id = %child.order_id, "Exit filled before cancel");
                    sweep.filled.push(slot);
                }
                Err(e) => {
                    tracing::warn!(symbol = %position.symbol, %slot, order_id = %child.order_id, error = %e, "Exit cancel failed");
                    sweep
                        .failures
                        .push(format!("{slot} {}: {e}", child.order_id));
                }
            }
        }
        sweep
    }

    /// Cancel `order_id` and confirm it no longer rests.
    ///
    /// A cancel refused because the order is not open is checked against its
    /// status: a still-pending order is returned as the original error.
    async fn confirm_cancel(
        &self,
        order_id: &BrokerOrderId,
    ) -> Result<CancelConfirmation, BrokerError> {
        match self.broker.cancel_order(order_id).await {
            Ok(()) => Ok(CancelConfirmation::Inactive),
            Err(e) if e.is_benign_cancel_failure() => {
                let report = self.broker.order_status(order_id).await?;
                match report.status {
                    OrderStatus::Filled => Ok(CancelConfirmation::Filled),
                    OrderStatus::Cancelled | OrderStatus::Rejected => {
                        Ok(CancelConfirmation::Inactive)
                    }
                    OrderStatus::Pending => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn notify_cancel_failures(&self, symbol: &Symbol, failures: &[String]) {
        if !failures.is_empty() {
            self.notifier
                .notify(&notifications::cancel_failures(symbol, failures))
                .await;
        }
    }

    async fn emergency_exit(
        &self,
        position: &Position,
        qty: u64,
    ) -> Result<BrokerOrderId, BrokerError> {
        let exit_id = self.broker.place_order(&position.exit_request(qty)).await?;
        tracing::warn!(symbol = %position.symbol, order_id = %exit_id, qty, "Emergency exit placed");
        observability::record_emergency_exit();
        Ok(exit_id)
    }

    /// Flatten an open position whose stop is gone.
    async fn emergency_close_locked(
        &self,
        mut position: Position,
        cause: &BrokerError,
    ) -> Result<(), OrchestratorError> {
        let sweep = self.cancel_exits(&position, None).await;
        for (slot, _) in &sweep.cancelled {
            position.child_orders.clear(*slot);
        }

        let qty = position.outstanding_qty();
        match self.emergency_exit(&position, qty).await {
            Ok(_) => {
                self.remove_locked(&position.symbol, CloseReason::Emergency)
                    .await;
                self.notifier
                    .notify(&notifications::emergency_exit(
                        &position.symbol,
                        qty,
                        &cause.to_string(),
                    ))
                    .await;
                Ok(())
            }
            Err(exit_error) => {
                let reason = format!("stop-loss: {cause}; emergency exit: {exit_error}");
                tracing::error!(symbol = %position.symbol, %reason, "Position left without protection");
                self.persist(&position).await;
                self.notifier
                    .notify(&notifications::protection_failed(&position.symbol, &reason))
                    .await;
                Err(OrchestratorError::ProtectionPlacementFailed {
                    symbol: position.symbol.to_string(),
                    reason,
                })
            }
        }
    }

    /// Write the position to the book and the store.
    ///
    /// The book stays authoritative when the store write fails.
    async fn persist(&self, position: &Position) {
        {
            let mut book = self.book.write();
            book.insert(position.symbol.clone(), position.clone());
            observability::update_open_positions(book.len());
        }
        if let Err(e) = self.store.save(position).await {
            tracing::error!(symbol = %position.symbol, error = %e, "Failed to persist position");
            self.notifier
                .notify(&notifications::store_failure(&position.symbol, &e.to_string()))
                .await;
        }
    }

    async fn remove_locked(&self, symbol: &Symbol, reason: CloseReason) {
        {
            let mut book = self.book.write();
            book.remove(symbol);
            observability::update_open_positions(book.len());
        }
        self.delete_persisted(symbol).await;
        self.stats.record_close(reason);
        observability::record_position_closed(reason.as_str());
    }

    async fn delete_persisted(&self, symbol: &Symbol) {
        if let Err(e) = self.store.delete(symbol).await {
            tracing::error!(%symbol, error = %e, "Failed to delete persisted position");
            self.notifier
                .notify(&notifications::store_failure(symbol, &e.to_string()))
                .await;
        }
    }
}

fn limit_exit(position: &Position, qty: u64, price: rust_decimal::Decimal) -> OrderRequest {
    OrderRequest::limit(
        position.symbol.clone(),
        position.instrument.clone(),
        position.direction.exit_side(),
        qty,
        price,
    )
}

fn closed_adjustment(symbol: &Symbol) -> AdjustOutcome {
    AdjustOutcome {
        symbol: symbol.to_string(),
        stop_loss_qty: 0,
        stop_order_id: None,
        closed: true,
    }
}

fn adjusted(position: &Position) -> AdjustOutcome {
    let stop = position.child(ChildSlot::StopLoss);
    AdjustOutcome {
        symbol: position.symbol.to_string(),
        stop_loss_qty: stop.map_or(0, |c| c.request.quantity),
        stop_order_id: stop.map(|c| c.order_id.to_string()),
        closed: false,
    }
}
