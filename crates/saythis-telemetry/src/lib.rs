//! Logging setup for saythis
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a single
//! fmt layer writing to stderr, so stdout stays free for command output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Initialize logging
///
/// `log_filter` uses `EnvFilter` directive syntax (`warn`, `tts=debug`). An
/// unparsable filter falls back to `warn`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(log_filter: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = filter(log_filter);

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false);

            registry.with(fmt_layer).try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(false);

            registry.with(fmt_layer).try_init()?;
        }
    }

    tracing::debug!(filter = log_filter, ?format, "logging initialized");

    Ok(())
}

fn filter(log_filter: &str) -> EnvFilter {
    EnvFilter::try_new(log_filter).unwrap_or_else(|_| EnvFilter::new("warn"))
}
