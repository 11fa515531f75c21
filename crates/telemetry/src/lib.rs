//! Telemetry for the edgepix interceptor
//!
//! Logging goes to stderr through `tracing`, either compact text or one
//! JSON object per line. stdout is left to the caller. Counters and
//! latency series live in a process-wide [`MetricsRegistry`].

mod metrics;

pub use metrics::{MetricsRegistry, Snapshot, Summary, Timer, SERIES_WINDOW};

use edgepix_core::config::LoggingConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

static REGISTRY: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// How log output is shaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// JSON lines instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
    /// Include the source file (text mode only)
    pub show_file: bool,
    /// Include the source line (text mode only)
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            json: true,
            show_target: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl From<&LoggingConfig> for TelemetryConfig {
    fn from(logging: &LoggingConfig) -> Self {
        Self {
            log_level: logging.level.clone(),
            json: logging.json,
            ..Default::default()
        }
    }
}

/// Install the global subscriber with default settings.
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let base = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(config.show_target)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(base.with(layer))
    } else {
        let layer = fmt::layer()
            .compact()
            .with_target(config.show_target)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(base.with(layer))
    };
    result.map_err(|e| anyhow::anyhow!("tracing subscriber already installed: {e}"))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        json = config.json,
        "telemetry ready"
    );
    Ok(())
}

/// Random id shared by every log line from this process.
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// The process-wide registry.
pub fn metrics() -> &'static MetricsRegistry {
    &REGISTRY
}
