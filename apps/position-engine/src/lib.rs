// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Position Engine - Rust Core Library
//!
//! Turns strategy signals into broker positions protected by a stop-loss,
//! a take-profit and an optional partial take-profit, and keeps the local
//! book consistent with the broker.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `orders`: Order requests, sides, types and broker status
//!   - `position_lifecycle`: Position aggregate, child order slots, leg sizing
//!
//! - **Application**: Orchestration
//!   - `ports`: Interfaces for external systems (`BrokerPort`, `PositionStorePort`, ...)
//!   - `services`: `PositionOrchestrator`, `FillMonitor`, `Reconciler`,
//!     `DailySummary`, `ShutdownCoordinator`
//!   - `dto`: Commands and outcomes
//!
//! - **Infrastructure**: Adapters
//!   - `broker`: Upstox adapter, paper broker, retrying decorator
//!   - `calendar`: Exchange session calendar
//!   - `resolver`: Symbol to instrument map
//!   - `notifier`: Telegram and log notifiers
//!   - `persistence`: JSON file and in-memory position stores
//!   - `http`: Signal webhook and operator endpoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Orchestrator, background tasks and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Broker retry policy and HTTP status classification.
pub mod broker;

/// YAML configuration loading and validation.
pub mod config;

/// Error taxonomy with HTTP mapping.
pub mod error;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber and OpenTelemetry export.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::orders::{OrderRequest, OrderSide, OrderStatus, OrderType};
pub use domain::position_lifecycle::{ChildSlot, CloseReason, Direction, Position, ProtectionLevels};
pub use domain::shared::{BrokerOrderId, DomainError, InstrumentKey, Symbol};

// Application re-exports
pub use application::dto::{OpenPositionCommand, OpenPositionOutcome, OpenStatus};
pub use application::ports::{
    BrokerError, BrokerPort, MarketCalendarPort, NotifierPort, PositionStorePort,
    SymbolResolverPort,
};
pub use application::services::{
    DailySummary, FillMonitor, PositionOrchestrator, Reconciler, ShutdownCoordinator,
};

// Infrastructure re-exports
pub use infrastructure::broker::{PaperBroker, RetryingBroker, UpstoxBrokerAdapter};
pub use infrastructure::http::{AppState, create_router};

pub use error::{ErrorCode, OrchestratorError};
