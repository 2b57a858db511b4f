//! Tracing setup for the `rust_scope` binary.
//!
//! The configured level applies to this workspace's crates (`rust_scope`,
//! `scope_core`, `scope_driver_mock`). Everything else, such as config loading
//! internals, stays at `warn`. `RUST_LOG`, when set, replaces the whole filter.
//!
//! Facade operations open spans (`#[instrument]` in scope-core); turn on
//! `span_events` to see them open and close.
//!
//! # Example
//! ```no_run
//! use rust_scope::{config::AppConfig, logging};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! logging::init_from_config(&config)?;
//!
//! tracing::info!("scope ready");
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::AppConfig;

/// Crates whose events follow the configured level.
const SCOPE_TARGETS: [&str; 3] = ["rust_scope", "scope_core", "scope_driver_mock"];

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Multi-line, colored
    Pretty,
    /// One line per event
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Resolved logging settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for this workspace's crates.
    pub level: Level,
    /// Line format.
    pub format: OutputFormat,
    /// Emit span open/close events.
    pub with_span_events: bool,
    /// Include source file and line.
    pub with_file_and_line: bool,
    /// Colorize pretty and compact output.
    pub with_ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl TracingConfig {
    /// Settings from the `[logging]` section.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, String> {
        Ok(Self {
            with_span_events: config.logging.span_events,
            with_file_and_line: config.logging.file_and_line,
            ..Self::new(parse_log_level(&config.logging.level)?).with_format(config.logging.format)
        })
    }

    /// Compact, colored output at `level`.
    pub fn new(level: Level) -> Self {
        Self {
            level,
            format: OutputFormat::Compact,
            with_span_events: false,
            with_file_and_line: false,
            with_ansi: true,
        }
    }

    /// Set output format
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable or disable span events
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }

    /// Enable or disable ANSI colors
    pub fn with_ansi(mut self, enabled: bool) -> Self {
        self.with_ansi = enabled;
        self
    }

    /// `EnvFilter` directives for this configuration.
    pub fn filter_directives(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        std::iter::once("warn".to_string())
            .chain(SCOPE_TARGETS.iter().map(|target| format!("{}={}", target, level)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber described by `[logging]`.
pub fn init_from_config(config: &AppConfig) -> Result<(), String> {
    init(TracingConfig::from_app_config(config)?)
}

/// Install the global subscriber.
///
/// Does nothing if a subscriber is already installed, so tests and embedding
/// applications can call it freely.
pub fn init(config: TracingConfig) -> Result<(), String> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(config.filter_directives())
            .map_err(|e| format!("Invalid log filter: {}", e))?,
    };

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_span_events(span_events)
        .with_file(config.with_file_and_line)
        .with_line_number(config.with_file_and_line);

    let layer = match config.format {
        OutputFormat::Pretty => base.pretty().with_ansi(config.with_ansi).boxed(),
        OutputFormat::Compact => base
            .compact()
            .with_target(false)
            .with_ansi(config.with_ansi)
            .boxed(),
        OutputFormat::Json => base.json().with_current_span(true).with_ansi(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .or_else(|e| {
            // Lost a race with another initializer.
            if tracing::dispatcher::has_been_set() {
                Ok(())
            } else {
                Err(format!("Failed to initialize tracing: {}", e))
            }
        })
}

/// Parse `trace`..`error`, case-insensitively.
fn parse_log_level(level: &str) -> Result<Level, String> {
    Level::from_str(level.trim()).map_err(|_| {
        format!(
            "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
            level
        )
    })
}
