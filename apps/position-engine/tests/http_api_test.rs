//! HTTP API Integration Tests
//!
//! Exercises the router end to end with `tower::ServiceExt::oneshot`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{Harness, command, levels};
use position_engine::domain::orders::OrderType;
use position_engine::domain::position_lifecycle::Direction;
use position_engine::domain::shared::Symbol;
use position_engine::infrastructure::http::{AppState, create_router};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

fn router(h: &Harness) -> axum::Router {
    create_router(AppState {
        orchestrator: Arc::clone(&h.orchestrator),
        version: "test".to_string(),
    })
}

async fn send(h: &Harness, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(h).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "text/plain")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn open_reliance(h: &Harness) {
    h.orchestrator
        .open_position(command(
            "RELIANCE",
            Direction::Long,
            10,
            levels(Some(dec!(95)), Some(dec!(110)), Some(dec!(105))),
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health() {
    let h = Harness::new();

    let (status, body) = send(&h, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], "test");
    assert_eq!(body["session_open"], true);
    assert_eq!(body["open_positions"], 0);
}

#[tokio::test]
async fn test_webhook_buy_opens_position() {
    let h = Harness::new();

    let (status, body) = send(
        &h,
        post(
            "/webhook",
            r#"{"action":"BUY","symbol":"RELIANCE","qty":10,"sl":95,"tp":110,"tp1":105}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "opened");
    assert_eq!(body["status"], "open");
    assert_eq!(body["direction"], "LONG");
    assert_eq!(body["filled_qty"], 10);
    assert!(body["child_order_ids"]["stop_loss"].is_string());
    assert_eq!(h.placed_of(OrderType::StopMarket)[0].quantity, 10);
}

#[tokio::test]
async fn test_webhook_accepts_string_numbers_and_unrendered_placeholders() {
    let h = Harness::new();

    let (status, body) = send(
        &h,
        post(
            "/webhook",
            r#"{"action":"sell","symbol":"INFY","qty":"3","sl":"1550.5","tp":"{{plot_1}}"}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["direction"], "SHORT");
    assert!(body["child_order_ids"]["take_profit"].is_null());
    let stop = &h.placed_of(OrderType::StopMarket)[0];
    assert_eq!(stop.trigger_price, Some(dec!(1550.5)));
    assert_eq!(stop.quantity, 3);
}

#[tokio::test]
async fn test_webhook_derives_levels_from_risk() {
    let h = Harness::new();

    let (status, _) = send(
        &h,
        post(
            "/webhook",
            r#"{"action":"BUY","symbol":"SBIN","qty":2,"price":800,"risk":10,"rr":2}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(h.placed_of(OrderType::StopMarket)[0].trigger_price, Some(dec!(790)));
    assert_eq!(h.placed_of(OrderType::Limit)[0].limit_price, Some(dec!(820)));
}

#[tokio::test]
async fn test_webhook_malformed_body_is_invalid_signal() {
    let h = Harness::new();

    let (status, body) = send(&h, post("/webhook", "BUY RELIANCE")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SIGNAL");
    assert!(h.broker.placed_orders().is_empty());
}

#[tokio::test]
async fn test_webhook_fractional_quantity_rejected() {
    let h = Harness::new();

    let (status, body) = send(
        &h,
        post("/webhook", r#"{"action":"BUY","symbol":"RELIANCE","qty":1.5}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_SIGNAL");
}

#[tokio::test]
async fn test_webhook_session_closed_is_conflict() {
    let h = Harness::new();
    h.calendar.set_open(false);

    let (status, body) = send(
        &h,
        post("/webhook", r#"{"action":"BUY","symbol":"RELIANCE","qty":1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "SESSION_CLOSED");
    assert_eq!(body["details"]["symbol"], "RELIANCE");
}

#[tokio::test]
async fn test_webhook_unknown_symbol_is_unprocessable() {
    let h = Harness::new();

    let (status, body) = send(
        &h,
        post("/webhook", r#"{"action":"BUY","symbol":"TCS","qty":1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "UNKNOWN_SYMBOL");
}

#[tokio::test]
async fn test_webhook_close_action() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(
        &h,
        post("/webhook", r#"{"action":"CLOSE","symbol":"RELIANCE"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "closed");
    assert_eq!(body["exit_qty"], 10);
    assert!(h.orchestrator.positions().is_empty());
}

#[tokio::test]
async fn test_list_positions() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(&h, get("/positions")).await;

    assert_eq!(status, StatusCode::OK);
    let positions = body["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0]["symbol"], "RELIANCE");
    assert_eq!(positions[0]["instrument"], "NSE_EQ|INE002A01018");
    assert_eq!(positions[0]["outstanding_qty"], 10);
    assert_eq!(positions[0]["partial_filled"], false);
}

#[tokio::test]
async fn test_close_position_route() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(&h, post("/positions/RELIANCE/close", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "manual");
    assert_eq!(h.broker.holding(&Symbol::new("RELIANCE")), 0);
}

#[tokio::test]
async fn test_close_unknown_position_is_not_found() {
    let h = Harness::new();

    let (status, body) = send(&h, post("/positions/INFY/close", "")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "POSITION_NOT_FOUND");
}

#[tokio::test]
async fn test_close_all_route() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(&h, post("/positions/close-all", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed_symbols"], json!(["RELIANCE"]));
    assert_eq!(body["failed_symbols"], json!([]));
}

#[tokio::test]
async fn test_stats_route() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(&h, get("/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["opened"], 1);
    assert_eq!(body["open_positions"], 1);
    assert!(body["session_date"].is_string());
}

#[tokio::test]
async fn test_summary_route_sends_and_resets() {
    let h = Harness::new();
    open_reliance(&h).await;

    let (status, body) = send(&h, post("/summary", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["opened"], 1);
    assert_eq!(body["open_positions"], 1);
    assert!(h.notifier.contains("DAILY SUMMARY"));
    assert_eq!(h.orchestrator.stats().snapshot().opened, 0);
}

#[tokio::test]
async fn test_summary_route_after_close_replaces_scheduled_summary() {
    use position_engine::application::services::DailySummary;
    use std::time::Duration;

    let h = Harness::new();
    let scheduled = DailySummary::new(Arc::clone(&h.orchestrator), Duration::from_secs(30));
    h.calendar.set_after_close(true);

    let (status, _) = send(&h, post("/summary", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(scheduled.run_once(chrono::Utc::now()).await.is_none());
    let summaries = h
        .notifier
        .messages()
        .into_iter()
        .filter(|m| m.contains("DAILY SUMMARY"))
        .count();
    assert_eq!(summaries, 1);
}
