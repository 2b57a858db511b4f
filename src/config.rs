//! Application configuration using Figment
//!
//! Configuration is loaded from, in increasing precedence:
//! 1. Built-in defaults (a demo microscope on the mock core)
//! 2. `config/rust_scope.toml`
//! 3. Environment variables prefixed with `RUST_SCOPE_`, nested keys split on `__`
//!
//! # Example
//! ```no_run
//! use rust_scope::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("wait timeout: {} ms", config.accessor.wait_timeout_ms);
//! # Ok::<(), rust_scope::config::ConfigError>(())
//! ```
//!
//! `RUST_SCOPE_LOGGING__LEVEL=debug` raises the log level;
//! `RUST_SCOPE_ACCESSOR__WAIT_TIMEOUT_MS=2000` shortens waits.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use scope_core::AccessorConfig;
use scope_driver_mock::MockCoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::logging::OutputFormat;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/rust_scope.toml";

/// Failure to produce a usable [`AppConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provider failed or a value had the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Values loaded but are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Accessor layer settings shared by every facade
    #[serde(default)]
    pub accessor: AccessorConfig,
    /// The simulated control core
    #[serde(default)]
    pub mock: MockCoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
    /// Log span open and close events
    #[serde(default)]
    pub span_events: bool,
    /// Include source file and line
    #[serde(default)]
    pub file_and_line: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: OutputFormat::default(),
            span_events: false,
            file_and_line: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path, then validate it.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path.as_ref())
            .extract()
            .map_err(Box::new)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("RUST_SCOPE_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            ));
        }
        self.accessor
            .validate()
            .map_err(|e| format!("accessor: {}", e))?;
        self.mock.validate().map_err(|e| format!("mock: {}", e))?;
        Ok(())
    }
}
