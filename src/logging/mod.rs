// Logging module for structured logging using the tracing crate

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::OverlayError;

fn default_level() -> String {
    "info".to_string()
}

/// Output format of log events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for log aggregation
    #[default]
    Json,
    /// Multi-line human readable output
    Pretty,
    /// Single-line human readable output
    Compact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "textoverlay=debug" (default: "info").
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// The effective filter: `RUST_LOG` if set, otherwise `level`.
    pub fn env_filter(&self) -> Result<EnvFilter, OverlayError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| {
                OverlayError::config(format!("invalid log level '{}': {}", self.level, e))
            }),
        }
    }
}

/// Initialize the global tracing subscriber
///
/// Events go to stderr so that command output on stdout stays parseable.
///
/// # Errors
///
/// Returns `Config` for an unparseable level directive and `Internal` if a
/// global subscriber is already installed.
///
/// # Examples
///
/// ```ignore
/// use textoverlay::logging::{init_subscriber, LoggingConfig};
///
/// init_subscriber(&LoggingConfig::default())?;
/// tracing::info!("Engine started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), OverlayError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    result.map_err(|e| OverlayError::Internal(format!("failed to install subscriber: {}", e)))
}
