//! Operator notification texts.
//!
//! Messages are Telegram-flavoured HTML: only `<b>` and `<code>` tags, with
//! every interpolated value escaped.

use std::fmt::Write as _;

use chrono::NaiveDate;

use crate::application::dto::{OpenPositionOutcome, OpenStatus};
use crate::domain::position_lifecycle::{ChildSlot, CloseReason, Position, ProtectionLevels};
use crate::domain::shared::{BrokerOrderId, Symbol};

use super::session_stats::StatsSnapshot;

/// Escape `&`, `<` and `>` for HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn level(price: Option<rust_decimal::Decimal>) -> String {
    price.map_or_else(|| "-".to_string(), |p| format!("₹{p}"))
}

pub(crate) fn position_opened(outcome: &OpenPositionOutcome, levels: &ProtectionLevels) -> String {
    let header = match outcome.status {
        OpenStatus::Open => "POSITION OPEN",
        OpenStatus::Degraded => "POSITION OPEN (DEGRADED)",
        OpenStatus::Flattened => "POSITION FLATTENED",
    };
    let mut text = format!(
        "<b>{header}</b>\n<b>{}</b> {} {} / {}\nSL: {} | TP: {} | Partial: {}",
        escape_html(&outcome.symbol),
        outcome.direction,
        outcome.filled_qty,
        outcome.requested_qty,
        level(levels.stop_loss),
        level(levels.take_profit),
        level(levels.partial_take_profit),
    );
    if let Some(reversal) = &outcome.reversal {
        let _ = write!(
            text,
            "\nReversed {} {} (exit <code>{}</code>)",
            reversal.previous_direction,
            reversal.exit_qty,
            escape_html(&reversal.exit_order_id)
        );
    }
    for warning in &outcome.warnings {
        let _ = write!(text, "\n⚠️ {}", escape_html(warning));
    }
    text
}

pub(crate) fn protection_failed(symbol: &Symbol, reason: &str) -> String {
    format!(
        "🚨 <b>UNPROTECTED POSITION</b>\n<b>{}</b> has no stop-loss and could not be flattened.\n{}\nManual action required.",
        escape_html(symbol.as_str()),
        escape_html(reason)
    )
}

pub(crate) fn entry_timeout(symbol: &Symbol, order_id: &BrokerOrderId, waited_ms: u64) -> String {
    format!(
        "⏳ <b>ENTRY NOT CONFIRMED</b>\n<b>{}</b> entry <code>{}</code> not filled after {waited_ms}ms. No protection placed; check the order manually.",
        escape_html(symbol.as_str()),
        escape_html(order_id.as_str())
    )
}

pub(crate) fn position_closed(
    symbol: &Symbol,
    reason: CloseReason,
    exit_qty: u64,
    exit_order_id: Option<&BrokerOrderId>,
) -> String {
    let mut text = format!(
        "<b>POSITION CLOSED</b>\n<b>{}</b>\nReason: {reason}",
        escape_html(symbol.as_str())
    );
    if let Some(id) = exit_order_id {
        let _ = write!(text, "\nExit: {exit_qty} (<code>{}</code>)", escape_html(id.as_str()));
    }
    text
}

pub(crate) fn exit_failed(symbol: &Symbol, reason: &str) -> String {
    format!(
        "❌ <b>EXIT FAILED</b>\n<b>{}</b> is still open: {}",
        escape_html(symbol.as_str()),
        escape_html(reason)
    )
}

pub(crate) fn cancel_failures(symbol: &Symbol, failures: &[String]) -> String {
    format!(
        "⚠️ <b>CANCEL FAILED</b>\n<b>{}</b> orders may still be resting:\n{}",
        escape_html(symbol.as_str()),
        escape_html(&failures.join("\n"))
    )
}

pub(crate) fn partial_adjusted(symbol: &Symbol, stop_qty: u64, stop_id: &BrokerOrderId) -> String {
    format!(
        "<b>PARTIAL TARGET FILLED</b>\n<b>{}</b> stop-loss resized to {stop_qty} (<code>{}</code>)",
        escape_html(symbol.as_str()),
        escape_html(stop_id.as_str())
    )
}

pub(crate) fn target_reduced(symbol: &Symbol, remaining_qty: u64) -> String {
    format!(
        "<b>TARGET FILLED</b>\n<b>{}</b> {remaining_qty} still held behind the partial target; stop-loss resized",
        escape_html(symbol.as_str())
    )
}

pub(crate) fn emergency_exit(symbol: &Symbol, quantity: u64, cause: &str) -> String {
    format!(
        "🚨 <b>EMERGENCY EXIT</b>\n<b>{}</b> closed {quantity} at market: {}",
        escape_html(symbol.as_str()),
        escape_html(cause)
    )
}

pub(crate) fn rearmed(symbol: &Symbol, slot: ChildSlot, order_id: &BrokerOrderId) -> String {
    format!(
        "<b>ORDER RE-ARMED</b>\n<b>{}</b> {slot} recreated (<code>{}</code>)",
        escape_html(symbol.as_str()),
        escape_html(order_id.as_str())
    )
}

pub(crate) fn rearm_failed(symbol: &Symbol, slot: ChildSlot, reason: &str) -> String {
    format!(
        "⚠️ <b>RE-ARM FAILED</b>\n<b>{}</b> {slot} dropped: {}",
        escape_html(symbol.as_str()),
        escape_html(reason)
    )
}

pub(crate) fn store_failure(symbol: &Symbol, reason: &str) -> String {
    format!(
        "⚠️ <b>STORE WRITE FAILED</b>\n<b>{}</b>: {}",
        escape_html(symbol.as_str()),
        escape_html(reason)
    )
}

pub(crate) fn ghost_removed(position: &Position) -> String {
    let resting: Vec<String> = position
        .resting_exits()
        .into_iter()
        .map(|(slot, child)| format!("{slot} {}", child.order_id))
        .collect();
    let mut text = format!(
        "🔍 <b>RECONCILIATION</b>\n<b>{}</b> {} {} is not held at the broker; removed locally.",
        escape_html(position.symbol.as_str()),
        position.direction,
        position.outstanding_qty()
    );
    if !resting.is_empty() {
        let _ = write!(text, "\nCheck resting orders: {}", escape_html(&resting.join(", ")));
    }
    text
}

pub(crate) fn untracked_holdings(holdings: &[(Symbol, i64)]) -> String {
    let lines: Vec<String> = holdings
        .iter()
        .map(|(symbol, qty)| format!("{} {qty}", symbol.as_str()))
        .collect();
    format!(
        "🔍 <b>RECONCILIATION</b>\nUntracked broker holdings (not adopted):\n{}",
        escape_html(&lines.join("\n"))
    )
}

pub(crate) fn quantity_mismatches(mismatches: &[(Symbol, i64, i64)]) -> String {
    let lines: Vec<String> = mismatches
        .iter()
        .map(|(symbol, local, broker)| format!("{} local {local} broker {broker}", symbol.as_str()))
        .collect();
    format!(
        "🔍 <b>RECONCILIATION</b>\nQuantity divergence:\n{}",
        escape_html(&lines.join("\n"))
    )
}

pub(crate) fn shutdown(cancelled: usize, failed: &[String], timed_out: bool) -> String {
    let mut text = format!(
        "🛑 <b>SHUTTING DOWN</b>\nCancelled {cancelled} resting orders. Open positions are left unprotected until restart."
    );
    if !failed.is_empty() {
        let _ = write!(text, "\nFailed: {}", escape_html(&failed.join(", ")));
    }
    if timed_out {
        text.push_str("\nSweep timed out before finishing.");
    }
    text
}

pub(crate) fn startup(positions: &[Position], mode: &str) -> String {
    let mut text = format!("🤖 <b>POSITION ENGINE STARTED</b>\nBroker: {}", escape_html(mode));
    if positions.is_empty() {
        text.push_str("\nNo open positions restored.");
    } else {
        let _ = write!(text, "\nRestored {} positions:", positions.len());
        for position in positions {
            let _ = write!(
                text,
                "\n<b>{}</b> {} {}",
                escape_html(position.symbol.as_str()),
                position.direction,
                position.outstanding_qty()
            );
        }
    }
    text
}

pub(crate) fn daily_summary(date: NaiveDate, stats: &StatsSnapshot, open_positions: usize) -> String {
    format!(
        "📊 <b>DAILY SUMMARY</b>\n<b>{}</b>\nOpened: {} (degraded {}, flattened {})\nTarget hits: {} | Stop hits: {}\nWin rate: {:.1}%\nManual: {} | Reversals: {} | Emergency: {}\nStill open: {open_positions}",
        date.format("%d-%m-%Y"),
        stats.opened,
        stats.degraded,
        stats.flattened,
        stats.take_profit_hits,
        stats.stop_loss_hits,
        stats.win_rate,
        stats.manual_closes,
        stats.reversals,
        stats.emergency_exits,
    )
}
