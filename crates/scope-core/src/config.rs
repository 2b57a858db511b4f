//! Accessor layer configuration.
//!
//! Loaded with Figment from a TOML file, with `SCOPE_`-prefixed environment
//! variables taking precedence:
//!
//! ```toml
//! wait_timeout_ms = 5000
//! backlash_property = "Backlash-B(um)"
//!
//! [read_retry]
//! max_attempts = 3
//! backoff_ms = 100
//! ```
//!
//! `SCOPE_WAIT_TIMEOUT_MS=2000` overrides the wait timeout.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error_recovery::RetryPolicy;

/// Default bound on `wait_for_device` (the core's default 5 s timeout).
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;

/// Default backlash property key (ASI stage controllers).
pub const DEFAULT_BACKLASH_PROPERTY: &str = "Backlash-B(um)";

/// Settings shared by the property accessor and every facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorConfig {
    /// Upper bound on a wait for an idle device, in milliseconds.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Retry of transient read failures.
    #[serde(default)]
    pub read_retry: RetrySettings,

    /// Property key holding a stage's backlash compensation.
    #[serde(default = "default_backlash_property")]
    pub backlash_property: String,
}

/// Serializable form of a [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first; `1` disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between attempts in milliseconds.
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

fn default_wait_timeout() -> u64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

fn default_backlash_property() -> String {
    DEFAULT_BACKLASH_PROPERTY.to_string()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff() -> u64 {
    100
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff(),
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        RetryPolicy {
            max_attempts: settings.max_attempts,
            backoff_delay: Duration::from_millis(settings.backoff_ms),
        }
    }
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout(),
            read_retry: RetrySettings::default(),
            backlash_property: default_backlash_property(),
        }
    }
}

impl AccessorConfig {
    /// Load from `path` plus `SCOPE_` environment overrides, then validate.
    ///
    /// Missing files are not an error; defaults apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SCOPE_").split("__"))
            .extract()?;
        config.validate().map_err(figment::Error::from)?;
        Ok(config)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        if self.wait_timeout_ms == 0 {
            return Err("wait_timeout_ms must be greater than 0".to_string());
        }
        if self.read_retry.max_attempts == 0 {
            return Err("read_retry.max_attempts must be at least 1".to_string());
        }
        if self.backlash_property.trim().is_empty() {
            return Err("backlash_property must not be empty".to_string());
        }
        Ok(())
    }

    /// Bound on `wait_for_device`.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Retry policy for reads.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.read_retry)
    }
}
