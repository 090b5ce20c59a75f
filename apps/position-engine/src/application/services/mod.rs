//! Application Services
//!
//! The orchestrator and the background tasks that keep its book consistent
//! with the broker. Every background task exposes `run_once` for a single
//! iteration and `spawn` for the cancellable loop.

mod daily_summary;
mod fill_monitor;
pub mod notifications;
mod orchestrator;
mod reconciler;
mod session_stats;
mod shutdown;
mod symbol_locks;

pub use daily_summary::{DailySummary, send_summary};
pub use fill_monitor::{FillMonitor, FillMonitorConfig, MonitorScan};
pub use orchestrator::{ExitCompletion, OrchestratorConfig, PositionOrchestrator, RearmOutcome};
pub use reconciler::{QuantityMismatch, ReconciliationReport, Reconciler, ReconcilerConfig};
pub use session_stats::{SessionStats, StatsSnapshot};
pub use shutdown::{ShutdownCoordinator, ShutdownReport};
pub use symbol_locks::SymbolLocks;
