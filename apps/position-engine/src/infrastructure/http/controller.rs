//! HTTP Controller (Driver Adapter)
//!
//! Axum-based REST API in front of the position orchestrator.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use uuid::Uuid;

use crate::application::dto::{CloseAllOutcome, ClosePositionOutcome};
use crate::application::services::{PositionOrchestrator, send_summary};
use crate::domain::position_lifecycle::CloseReason;
use crate::domain::shared::Symbol;
use crate::error::OrchestratorError;

use super::request::{WebhookRequest, WebhookSignal};
use super::response::{
    ApiError, HealthResponse, PositionView, PositionsResponse, StatsResponse, WebhookResponse,
};

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState {
    /// Position orchestrator.
    pub orchestrator: Arc<PositionOrchestrator>,
    /// Application version.
    pub version: String,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            version: self.version.clone(),
        }
    }
}

/// Create the HTTP router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/webhook", post(webhook))
        .route("/positions", get(list_positions))
        .route("/positions/close-all", post(close_all))
        .route("/positions/{symbol}/close", post(close_position))
        .route("/stats", get(stats))
        .route("/summary", post(summary))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        session_open: state.orchestrator.calendar().is_session_open(Utc::now()),
        open_positions: state.orchestrator.positions().len(),
    })
}

/// Signal webhook. Accepts JSON regardless of the declared content type.
#[tracing::instrument(skip_all, fields(signal_id = %Uuid::new_v4()))]
async fn webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let request: WebhookRequest =
        serde_json::from_slice(&body).map_err(|e| OrchestratorError::InvalidSignal {
            message: format!("malformed payload: {e}"),
        })?;

    match request.into_signal()? {
        WebhookSignal::Open(command) => {
            tracing::info!(
                symbol = %command.symbol,
                direction = %command.direction,
                qty = command.quantity,
                "Signal received"
            );
            let outcome = state.orchestrator.open_position(command).await?;
            Ok(Json(WebhookResponse::Opened(outcome)))
        }
        WebhookSignal::Close(symbol) => {
            tracing::info!(%symbol, "Close signal received");
            let outcome = state
                .orchestrator
                .close_position(&symbol, CloseReason::Manual)
                .await?;
            Ok(Json(WebhookResponse::Closed(outcome)))
        }
    }
}

/// Open positions.
async fn list_positions(State(state): State<AppState>) -> Json<PositionsResponse> {
    let positions = state
        .orchestrator
        .positions()
        .iter()
        .map(PositionView::from)
        .collect();
    Json(PositionsResponse { positions })
}

/// Close one position at market.
async fn close_position(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ClosePositionOutcome>, ApiError> {
    let outcome = state
        .orchestrator
        .close_position(&Symbol::new(symbol), CloseReason::Manual)
        .await?;
    Ok(Json(outcome))
}

/// Close every position at market.
async fn close_all(State(state): State<AppState>) -> Json<CloseAllOutcome> {
    Json(state.orchestrator.close_all().await)
}

/// Session statistics.
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let orchestrator = &state.orchestrator;
    Json(StatsResponse {
        session_date: orchestrator.calendar().session_date(Utc::now()),
        stats: orchestrator.stats().snapshot(),
        open_positions: orchestrator.positions().len(),
    })
}

/// Send the daily summary now and reset the statistics.
///
/// After the close this counts as the session's summary, so the scheduled
/// one is not sent again.
async fn summary(State(state): State<AppState>) -> Json<StatsResponse> {
    let orchestrator = &state.orchestrator;
    let now = Utc::now();
    let calendar = orchestrator.calendar();
    let session_date = calendar.session_date(now);
    if calendar.is_after_close(now) {
        orchestrator.stats().mark_summarized(session_date);
    }
    let stats = send_summary(orchestrator, session_date).await;
    Json(StatsResponse {
        session_date,
        stats,
        open_positions: orchestrator.positions().len(),
    })
}
