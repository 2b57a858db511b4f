//! Operational modes for the mock core.
//!
//! - **Instant**: moves complete immediately, no call latency (unit tests)
//! - **Realistic**: moves keep the device busy for a computed travel time
//! - **Chaos**: random injected failures at the configured rate

use serde::{Deserialize, Serialize};

/// Operational modes for the mock core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockMode {
    /// Zero delays, deterministic - for unit tests
    #[default]
    Instant,
    /// Hardware-like timing - for integration tests
    Realistic,
    /// Random failures - for resilience testing
    Chaos,
}

impl MockMode {
    /// Whether motion and call latency are simulated.
    pub fn is_timed(&self) -> bool {
        matches!(self, MockMode::Realistic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode() {
        assert_eq!(MockMode::default(), MockMode::Instant);
    }

    #[test]
    fn test_only_realistic_is_timed() {
        assert!(!MockMode::Instant.is_timed());
        assert!(MockMode::Realistic.is_timed());
        assert!(!MockMode::Chaos.is_timed());
    }

    #[test]
    fn test_mode_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: MockMode,
        }
        let parsed: Wrapper = toml::from_str(r#"mode = "realistic""#).unwrap();
        assert_eq!(parsed.mode, MockMode::Realistic);
    }
}
