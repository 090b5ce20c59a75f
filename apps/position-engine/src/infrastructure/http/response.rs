//! HTTP response DTOs.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::application::dto::{ChildOrderIds, ClosePositionOutcome, OpenPositionOutcome};
use crate::application::services::StatsSnapshot;
use crate::domain::position_lifecycle::{Direction, Position};
use crate::error::OrchestratorError;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Whether the trading session is open now.
    pub session_open: bool,
    /// Open positions.
    pub open_positions: usize,
}

/// Result of a webhook signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WebhookResponse {
    /// A position was opened (or the entry flattened).
    Opened(OpenPositionOutcome),
    /// A position was closed.
    Closed(ClosePositionOutcome),
}

/// One open position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionView {
    /// Symbol.
    pub symbol: String,
    /// Instrument key.
    pub instrument: String,
    /// Long or short.
    pub direction: Direction,
    /// Quantity the signal asked for.
    pub requested_qty: u64,
    /// Quantity filled at entry.
    pub filled_qty: u64,
    /// Quantity still held.
    pub outstanding_qty: u64,
    /// Whether the partial target filled.
    pub partial_filled: bool,
    /// Child order ids.
    pub child_order_ids: ChildOrderIds,
    /// When the entry filled.
    pub created_at: DateTime<Utc>,
}

impl From<&Position> for PositionView {
    fn from(position: &Position) -> Self {
        Self {
            symbol: position.symbol.to_string(),
            instrument: position.instrument.to_string(),
            direction: position.direction,
            requested_qty: position.requested_qty,
            filled_qty: position.filled_qty,
            outstanding_qty: position.outstanding_qty(),
            partial_filled: position.partial_filled,
            child_order_ids: ChildOrderIds::from(&position.child_orders),
            created_at: position.created_at,
        }
    }
}

/// `GET /positions` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsResponse {
    /// Open positions ordered by symbol.
    pub positions: Vec<PositionView>,
}

/// `GET /stats` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Exchange-local session date.
    pub session_date: NaiveDate,
    /// Counters since the last daily summary.
    pub stats: StatsSnapshot,
    /// Open positions.
    pub open_positions: usize,
}

/// Error body with the status derived from the error code.
#[derive(Debug)]
pub struct ApiError(pub OrchestratorError);

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_http_response())).into_response()
    }
}
