//! Position Engine Binary
//!
//! Starts the webhook server and the background tasks that keep positions
//! protected.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin position-engine
//! ```
//!
//! # Environment Variables
//!
//! - `POSITION_ENGINE_CONFIG`: Path to the YAML config (default: `config.yaml`)
//! - `UPSTOX_ACCESS_TOKEN`: Broker token, referenced from the config in live mode
//! - `TELEGRAM_BOT_TOKEN` / `TELEGRAM_CHAT_ID`: Notification sink (optional)
//! - `RUST_LOG`: Log filter (overrides `observability.logging.level`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use position_engine::application::ports::{
    BrokerPort, MarketCalendarPort, NotifierPort, PositionStorePort, SymbolResolverPort,
};
use position_engine::application::services::{
    DailySummary, FillMonitor, PositionOrchestrator, Reconciler, ShutdownCoordinator,
};
use position_engine::config::{BrokerMode, CONFIG_PATH_ENV, Config, StoreBackend, load_config};
use position_engine::infrastructure::broker::{PaperBroker, RetryingBroker, UpstoxBrokerAdapter};
use position_engine::infrastructure::http::{AppState, create_router};
use position_engine::infrastructure::notifier::{LogNotifier, TelegramNotifier};
use position_engine::infrastructure::persistence::{InMemoryPositionStore, JsonFilePositionStore};
use position_engine::infrastructure::resolver::StaticSymbolResolver;
use position_engine::observability::init_metrics;
use position_engine::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let config_path = std::env::var(CONFIG_PATH_ENV).ok();
    let config = load_config(config_path.as_deref()).context("failed to load configuration")?;

    let _telemetry = init_telemetry(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = config.broker.mode.as_str(),
        "Starting Position Engine"
    );

    init_observability(&config);

    // The shutdown sweep bypasses the retry decorator.
    let raw_broker = create_broker(&config)?;
    let broker: Arc<dyn BrokerPort> = Arc::new(RetryingBroker::new(
        Arc::clone(&raw_broker),
        config.broker.retry.to_policy(),
        config.broker.call_timeout(),
    ));

    let store = create_store(&config).await?;
    let calendar: Arc<dyn MarketCalendarPort> = Arc::new(config.session.to_calendar()?);
    let resolver = create_resolver(&config).await;
    let notifier = create_notifier(&config)?;

    let orchestrator = Arc::new(PositionOrchestrator::new(
        config.orchestrator.to_service_config(),
        broker,
        store,
        calendar,
        Arc::clone(&resolver) as Arc<dyn SymbolResolverPort>,
        Arc::clone(&notifier),
    ));
    orchestrator
        .restore()
        .await
        .context("failed to restore positions")?;
    orchestrator
        .announce_startup(config.broker.mode.as_str())
        .await;

    let token = CancellationToken::new();
    let tasks = spawn_background_tasks(&config, &orchestrator, resolver, &token);

    serve_http(&config, Arc::clone(&orchestrator)).await?;

    token.cancel();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    let coordinator = ShutdownCoordinator::new(
        raw_broker,
        Arc::clone(&notifier),
        config.shutdown.timeout(),
    );
    let report = coordinator.sweep(&orchestrator.positions()).await;
    if tokio::time::timeout(config.shutdown.timeout(), notifier.flush())
        .await
        .is_err()
    {
        tracing::warn!("Pending notifications dropped at shutdown");
    }
    tracing::info!(
        cancelled = report.cancelled.len(),
        failed = report.failed.len(),
        timed_out = report.timed_out,
        "Position engine stopped"
    );
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

fn init_observability(config: &Config) {
    let metrics = &config.observability.metrics;
    if !metrics.enabled {
        return;
    }
    match metrics.to_exporter_config() {
        Ok(exporter) => {
            if let Err(e) = init_metrics(&exporter) {
                tracing::warn!(error = %e, "Metrics exporter not started");
            }
        }
        Err(e) => tracing::warn!(error = %e, "Invalid metrics endpoint"),
    }
}

fn create_broker(config: &Config) -> anyhow::Result<Arc<dyn BrokerPort>> {
    match config.broker.mode {
        BrokerMode::Paper => {
            tracing::info!("Using paper broker");
            Ok(Arc::new(PaperBroker::new()))
        }
        BrokerMode::Live => {
            let upstox = config
                .broker
                .upstox
                .to_adapter_config(config.broker.call_timeout());
            let adapter =
                UpstoxBrokerAdapter::new(&upstox).context("failed to create Upstox adapter")?;
            tracing::info!(base_url = %upstox.base_url, product = %upstox.product, "Using Upstox broker");
            Ok(Arc::new(adapter))
        }
    }
}

async fn create_store(config: &Config) -> anyhow::Result<Arc<dyn PositionStorePort>> {
    match config.persistence.backend {
        StoreBackend::Memory => {
            tracing::warn!("Positions are kept in memory only and will not survive a restart");
            Ok(Arc::new(InMemoryPositionStore::new()))
        }
        StoreBackend::File => {
            let store = JsonFilePositionStore::open(&config.persistence.dir)
                .await
                .with_context(|| format!("failed to open store at {}", config.persistence.dir))?;
            Ok(Arc::new(store))
        }
    }
}

async fn create_resolver(config: &Config) -> Arc<StaticSymbolResolver> {
    let resolver = Arc::new(StaticSymbolResolver::new(
        config.instruments.map.clone(),
        config.instruments.file.as_ref().map(PathBuf::from),
    ));
    match resolver.refresh().await {
        Ok(count) => tracing::info!(instruments = count, "Instrument map loaded"),
        Err(e) => tracing::warn!(
            error = %e,
            instruments = resolver.len(),
            "Instrument file not loaded, using configured entries only"
        ),
    }
    resolver
}

fn create_notifier(config: &Config) -> anyhow::Result<Arc<dyn NotifierPort>> {
    match config.notifications.telegram.to_adapter_config() {
        Some(telegram) => {
            let notifier =
                TelegramNotifier::new(&telegram).context("failed to create Telegram notifier")?;
            tracing::info!("Telegram notifications enabled");
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::info!("Telegram not configured, notifications go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}

fn spawn_background_tasks(
    config: &Config,
    orchestrator: &Arc<PositionOrchestrator>,
    resolver: Arc<StaticSymbolResolver>,
    token: &CancellationToken,
) -> Vec<JoinHandle<()>> {
    let mut tasks = Vec::new();

    if config.monitor.enabled {
        let monitor = Arc::new(FillMonitor::new(
            Arc::clone(orchestrator),
            config.monitor.to_service_config(),
        ));
        tasks.push(monitor.spawn(token.clone()));
    }

    if config.reconciliation.enabled {
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(orchestrator),
            config.reconciliation.to_service_config(),
        ));
        tasks.push(reconciler.spawn(token.clone()));
    }

    if config.session.daily_summary {
        let summary = Arc::new(DailySummary::new(
            Arc::clone(orchestrator),
            config.session.summary_check_interval(),
        ));
        tasks.push(summary.spawn(token.clone()));
    }

    if config.instruments.file.is_some() {
        tasks.push(resolver.spawn_refresh(config.instruments.refresh_interval(), token.clone()));
    }

    tasks
}

async fn serve_http(config: &Config, orchestrator: Arc<PositionOrchestrator>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.http_port)
        .parse()
        .context("invalid server bind address")?;

    let state = AppState {
        orchestrator,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
