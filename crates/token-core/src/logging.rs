//! Tracing subscriber setup

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{Error, Result};

/// How the token service writes its logs
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Baseline level; `RUST_LOG` directives are added on top
    pub level: Level,
    /// One JSON object per line, for log shippers
    pub json: bool,
    pub file_info: bool,
    /// Emit an event when a span closes (request timings from the trace layer)
    pub log_spans: bool,
    pub app_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: Level::INFO,
            json: false,
            file_info: false,
            log_spans: false,
            app_name: "voice-token".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: Level, app_name: impl Into<String>) -> Self {
        LoggingConfig {
            level,
            app_name: app_name.into(),
            ..Default::default()
        }
    }

    pub fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    pub fn with_file_info(mut self) -> Self {
        self.file_info = true;
        self
    }

    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }
}

/// Install the global subscriber. Logs go to stderr so `issue` output on stdout stays clean.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(config.level.into());

    let span_events = if config.log_spans {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| Error::Configuration(format!("Failed to install logger: {}", e)))?;

    tracing::info!(app = %config.app_name, "Logging initialized");
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| Error::Configuration(format!("Invalid log level: {}", level)))
}
