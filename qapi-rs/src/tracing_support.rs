//! Tracing and logging support.
//!
//! The library itself only emits `tracing` events (registration at `info`,
//! dispatch and coercion fallbacks at `debug`, default padding at `warn`).
//! Binaries that want to see them install a subscriber with the helpers below.

pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "QAPI_LOG";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line, human-readable output.
    #[default]
    Pretty,

    /// Single-line output.
    Compact,

    /// One JSON object per event.
    Json,
}

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter.
    ///
    /// If None, uses `QAPI_LOG`, then `RUST_LOG`, then "info".
    pub level: Option<tracing::Level>,

    /// Output format.
    pub format: TracingFormat,

    /// Include target module names in output.
    pub target: bool,

    /// Include thread IDs in output.
    pub thread_ids: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Pretty,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
fn env_filter(level: Option<tracing::Level>) -> EnvFilter {
    if let Some(level) = level {
        return EnvFilter::new(level.to_string());
    }
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize a subscriber with default settings.
///
/// ```ignore
/// qapi::tracing_support::init_subscriber();
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    init_subscriber_with_config(TracingConfig::default());
}

/// Initialize a subscriber with a custom configuration.
///
/// Only one of the three format layers is active; the others are `None`, which
/// `tracing-subscriber` treats as a no-op layer.
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) {
    let pretty = (config.format == TracingFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(config.target)
            .with_thread_ids(config.thread_ids)
    });
    let compact = (config.format == TracingFormat::Compact).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_target(config.target)
            .with_thread_ids(config.thread_ids)
    });
    let json = (config.format == TracingFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(config.target)
            .with_thread_ids(config.thread_ids)
    });

    tracing_subscriber::registry()
        .with(env_filter(config.level))
        .with(pretty)
        .with(compact)
        .with(json)
        .init();
}

// Fallback when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}
