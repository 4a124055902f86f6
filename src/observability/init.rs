//! Subscriber setup.

use super::tracer;
use crate::infrastructure::{data_dir, expand_tilde};
use crate::Config;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_sdk::resource::Resource;
use std::path::PathBuf;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name used when no trace file is configured.
pub const DEFAULT_TRACE_FILE: &str = "typeahead-otlp.json";

/// Level used when neither `RUST_LOG` nor `trace_level` is set.
const DEFAULT_LEVEL: &str = "info";

/// Resolves where spans are written for `config`.
#[must_use]
pub fn trace_file_path(config: &Config) -> PathBuf {
    config
        .trace_file
        .as_deref()
        .map_or_else(|| data_dir().join(DEFAULT_TRACE_FILE), expand_tilde)
}

/// Installs a global subscriber exporting spans to the trace file.
///
/// The filter comes from `RUST_LOG` when set, then from `config.trace_level`,
/// then defaults to `info`. Tracing is optional: if the trace directory cannot
/// be created, or a global subscriber is already installed, this does nothing.
///
/// # Example
///
/// ```rust,no_run
/// use typeahead::observability::init_tracing;
/// use typeahead::Config;
///
/// init_tracing(&Config {
///     trace_level: Some("debug".to_string()),
///     ..Config::default()
/// });
///
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let trace_file = trace_file_path(config);
    if let Some(parent) = trace_file.parent() {
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.trace_level.as_deref().unwrap_or(DEFAULT_LEVEL))
    });

    let resource = Resource::new(vec![
        KeyValue::new("service.name", "typeahead"),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    let provider = tracer::file_tracer_provider(trace_file, resource);
    let otel_layer = OpenTelemetryLayer::new(provider.tracer("typeahead"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .try_init();
}
