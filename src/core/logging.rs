// Logging module, powered by tracing-subscriber.
//
// Events go to stderr; stdout carries command results only.

use crate::core::config::LogConfig;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Base level plus quieter defaults for dependencies.
fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    let directives = [level, "rusqlite=warn"].join(",");
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("Invalid tracing filter '{}': {}", directives, e))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter = build_env_filter(&config.level)?;

    let layer = match LogFormat::parse(&config.format) {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
    };

    // try_init: tests and embedders may have installed a subscriber already.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();

    tracing::trace!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
