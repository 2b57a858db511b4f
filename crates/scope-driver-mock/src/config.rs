//! Serde configuration for [`MockCore`](crate::MockCore).

use scope_core::DeviceRole;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::common::MockMode;
use crate::device::{MockDevice, MockProperty};

/// Everything needed to build a [`MockCore`](crate::MockCore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockCoreConfig {
    /// Operational mode.
    #[serde(default)]
    pub mode: MockMode,

    /// Seed for chaos-mode failures; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Failure probability per call in chaos mode.
    #[serde(default = "default_failure_rate")]
    pub failure_rate: f64,

    /// How long the core's own `wait_for_device` polls before giving up.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Loaded devices, each carrying the roles it holds at startup.
    #[serde(default)]
    pub devices: Vec<MockDevice>,
}

fn default_failure_rate() -> f64 {
    0.1
}

fn default_wait_timeout() -> u64 {
    5000
}

impl Default for MockCoreConfig {
    fn default() -> Self {
        Self::demo()
    }
}

impl MockCoreConfig {
    /// A small microscope: focus drive, XY stage, camera and shutter.
    pub fn demo() -> Self {
        let devices = vec![
            MockDevice::stage("ZStage")
                .with_role(DeviceRole::Focus)
                .with_travel(-5000.0, 5000.0)
                .with_property(MockProperty::float("Backlash-B(um)", 1.5).with_limits(0.0, 10.0))
                .with_property(MockProperty::float("Speed(um/s)", 1000.0).with_limits(1.0, 5000.0))
                .with_property(MockProperty::text("Description", "Mock focus drive").read_only()),
            MockDevice::xy_stage("XYStage")
                .with_role(DeviceRole::XYStage)
                .with_travel(-50_000.0, 50_000.0),
            MockDevice::generic("Camera")
                .with_role(DeviceRole::Camera)
                .with_property(MockProperty::float("Exposure", 10.0).with_limits(0.1, 10_000.0))
                .with_property(MockProperty::text("Binning", "1").with_allowed(["1", "2", "4"]))
                .with_property(MockProperty::text("PixelType", "16bit").read_only()),
            MockDevice::generic("Shutter")
                .with_role(DeviceRole::Shutter)
                .with_property(MockProperty::integer("State", 0).with_allowed(["0", "1"])),
        ];

        Self {
            mode: MockMode::Instant,
            seed: None,
            failure_rate: default_failure_rate(),
            wait_timeout_ms: default_wait_timeout(),
            devices,
        }
    }

    /// An empty core with no devices and no roles.
    pub fn empty() -> Self {
        Self {
            devices: Vec::new(),
            ..Self::demo()
        }
    }

    /// Core-side wait timeout.
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    /// Role to device label, as configured.
    pub fn roles(&self) -> HashMap<DeviceRole, String> {
        self.devices
            .iter()
            .flat_map(|d| d.roles.iter().map(move |role| (*role, d.label.clone())))
            .collect()
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(format!(
                "failure_rate must be within [0, 1], got {}",
                self.failure_rate
            ));
        }
        if self.wait_timeout_ms == 0 {
            return Err("wait_timeout_ms must be greater than 0".to_string());
        }

        let mut labels = HashSet::new();
        let mut holders: HashMap<DeviceRole, &str> = HashMap::new();
        for device in &self.devices {
            if device.label.trim().is_empty() {
                return Err("device label must not be empty".to_string());
            }
            if !labels.insert(device.label.as_str()) {
                return Err(format!("duplicate device label '{}'", device.label));
            }
            if let Some(prop) = device.properties.iter().find(|p| p.value.contains(',')) {
                return Err(format!(
                    "property '{}' on '{}' contains ','",
                    prop.name, device.label
                ));
            }
            for role in &device.roles {
                if let Some(other) = holders.insert(*role, device.label.as_str()) {
                    return Err(format!(
                        "role '{}' assigned to both '{}' and '{}'",
                        role, other, device.label
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_is_valid() {
        let config = MockCoreConfig::demo();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.roles().get(&DeviceRole::Focus).map(String::as_str),
            Some("ZStage")
        );
        assert!(!config.roles().contains_key(&DeviceRole::Galvo));
    }

    #[test]
    fn test_from_toml() {
        let config: MockCoreConfig = toml::from_str(
            r#"
mode = "realistic"
wait_timeout_ms = 250

[[devices]]
label = "Piezo"
kind = "stage"
roles = ["focus"]
"#,
        )
        .unwrap();

        assert_eq!(config.mode, MockMode::Realistic);
        assert_eq!(config.wait_timeout(), Duration::from_millis(250));
        assert_eq!(
            config.roles().get(&DeviceRole::Focus).map(String::as_str),
            Some("Piezo")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_role() {
        let parsed: Result<MockCoreConfig, _> = toml::from_str(
            r#"
[[devices]]
label = "X"
roles = ["periscope"]
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_rejects_role_held_twice() {
        let mut config = MockCoreConfig::empty();
        config.devices = vec![
            MockDevice::stage("A").with_role(DeviceRole::Focus),
            MockDevice::stage("B").with_role(DeviceRole::Focus),
        ];
        assert!(config.validate().unwrap_err().contains("both"));
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let mut config = MockCoreConfig::empty();
        config.devices = vec![MockDevice::stage("Z"), MockDevice::generic("Z")];
        assert!(config.validate().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn test_rejects_bad_failure_rate() {
        let config = MockCoreConfig {
            failure_rate: 1.5,
            ..MockCoreConfig::empty()
        };
        assert!(config.validate().is_err());
    }
}
