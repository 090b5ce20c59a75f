//! OpenTelemetry Tracing Setup
//!
//! Console logging through `tracing-subscriber`, with an optional OTLP span
//! exporter layered on top.
//!
//! # Configuration
//!
//! - `RUST_LOG`: overrides `observability.logging.level`
//! - `observability.tracing.enabled`: export spans over OTLP gRPC
//! - `observability.tracing.otlp_endpoint`: collector endpoint
//! - `observability.tracing.service_name`: service name on exported spans
//!
//! # Usage
//!
//! ```rust,ignore
//! use position_engine::telemetry::init_telemetry;
//!
//! let _guard = init_telemetry(&config.observability);
//! ```

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ObservabilityConfig;

/// Guard that shuts down the tracer provider on drop.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    #[must_use]
    pub const fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Error shutting down tracer provider: {e:?}");
        }
    }
}

fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_console(config: &ObservabilityConfig) -> TelemetryGuard {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(true)
        .init();
    TelemetryGuard { provider: None }
}

/// Initialize logging and, when enabled, OTLP trace export.
///
/// Returns a guard that will shut down the tracer provider when dropped.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
#[must_use]
pub fn init_telemetry(config: &ObservabilityConfig) -> TelemetryGuard {
    if !config.tracing.enabled {
        let guard = init_console(config);
        tracing::debug!("OpenTelemetry disabled, using console logging only");
        return guard;
    }

    let endpoint = &config.tracing.otlp_endpoint;
    let service_name = config.tracing.service_name.clone();

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
    {
        Ok(exp) => exp,
        Err(e) => {
            let guard = init_console(config);
            tracing::warn!(error = ?e, "Failed to create OTLP exporter, falling back to console logging");
            return guard;
        }
    };

    let provider = SdkTracerProvider::builder()
        .with_simple_exporter(exporter)
        .build();

    let tracer = provider.tracer(service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    Registry::default()
        .with(env_filter(config))
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    tracing::info!(
        service_name = %service_name,
        endpoint = %endpoint,
        "OpenTelemetry initialized"
    );

    TelemetryGuard {
        provider: Some(provider),
    }
}
