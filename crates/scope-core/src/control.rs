//! Control core boundary.
//!
//! The control core owns all device communication. This crate never implements it;
//! it only consumes it through the [`ControlCore`] trait. A binding to a real
//! hardware runtime, or the in-memory core in `scope-driver-mock`, implements the
//! trait, and the accessor layer wraps it.
//!
//! # Contract
//! - Every call may fail with a [`CoreError`]; implementations must not panic.
//! - Implementations must be `Send + Sync`. A core that cannot be called from
//!   several threads at once should be wrapped in
//!   [`SerializedCore`](crate::serialized::SerializedCore).
//! - `wait_for_device` may block for as long as the device is busy. Facades bound
//!   it with a timeout and a cancellation token, so implementations need not.
//! - `role_device` returns an empty string when no device holds the role.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Result of a control core call.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

// =============================================================================
// Roles and Names
// =============================================================================

/// Logical role a device can be bound to at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Active camera.
    Camera,
    /// Active shutter.
    Shutter,
    /// Active focus (Z) stage.
    Focus,
    /// Active XY stage.
    #[serde(rename = "xy_stage")]
    XYStage,
    /// Active autofocus device.
    #[serde(rename = "autofocus")]
    AutoFocus,
    /// Active image processor.
    ImageProcessor,
    /// Active spatial light modulator.
    Slm,
    /// Active galvo scanner.
    Galvo,
}

impl DeviceRole {
    /// All roles, in display order.
    pub const ALL: [DeviceRole; 8] = [
        DeviceRole::Camera,
        DeviceRole::Shutter,
        DeviceRole::Focus,
        DeviceRole::XYStage,
        DeviceRole::AutoFocus,
        DeviceRole::ImageProcessor,
        DeviceRole::Slm,
        DeviceRole::Galvo,
    ];

    /// Lower-case label used in logs, messages and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Shutter => "shutter",
            Self::Focus => "focus",
            Self::XYStage => "xy_stage",
            Self::AutoFocus => "autofocus",
            Self::ImageProcessor => "image_processor",
            Self::Slm => "slm",
            Self::Galvo => "galvo",
        }
    }
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DeviceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        DeviceRole::ALL
            .iter()
            .copied()
            .find(|role| role.label() == wanted || (wanted == "xystage" && *role == Self::XYStage))
            .ok_or_else(|| {
                let labels: Vec<&str> = DeviceRole::ALL.iter().map(|r| r.label()).collect();
                format!("unknown role '{}'. Must be one of: {}", s, labels.join(", "))
            })
    }
}

/// Label of a loaded device, as assigned at configuration time.
///
/// Never empty: an empty label from the core means "no device", which
/// [`DeviceResolver`](crate::resolver::DeviceResolver) reports as an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceName(String);

impl DeviceName {
    /// Wrap a label. Returns `None` for blank labels.
    pub fn new(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            None
        } else {
            Some(Self(label))
        }
    }

    /// The label as passed to the core.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DeviceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declared type of a device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// Free text or an enumerated set.
    String,
    /// Floating point.
    Float,
    /// Integer.
    Integer,
    /// The adapter did not declare a type.
    #[default]
    Undefined,
}

// =============================================================================
// Control Core Trait
// =============================================================================

/// Hardware control runtime consumed by the accessor layer.
///
/// Positions are in the device's native units (micrometres for stages).
#[async_trait]
pub trait ControlCore: Send + Sync {
    /// Label of the device currently assigned to `role`, or `""` if none.
    async fn role_device(&self, role: DeviceRole) -> CoreResult<String>;

    /// Labels of every loaded device.
    async fn loaded_devices(&self) -> CoreResult<Vec<String>>;

    // --- single axis stages ---

    /// Move to an absolute position.
    async fn set_position(&self, device: &str, position: f64) -> CoreResult<()>;

    /// Move by `delta` from the current position.
    async fn set_relative_position(&self, device: &str, delta: f64) -> CoreResult<()>;

    /// Current position.
    async fn get_position(&self, device: &str) -> CoreResult<f64>;

    // --- XY stages ---

    /// Move an XY stage to an absolute position.
    async fn set_xy_position(&self, device: &str, x: f64, y: f64) -> CoreResult<()>;

    /// Move an XY stage by `(dx, dy)`.
    async fn set_relative_xy_position(&self, device: &str, dx: f64, dy: f64) -> CoreResult<()>;

    /// Current XY position.
    async fn get_xy_position(&self, device: &str) -> CoreResult<(f64, f64)>;

    // --- motion control ---

    /// Halt motion.
    async fn stop(&self, device: &str) -> CoreResult<()>;

    /// Run the device's homing procedure.
    async fn home(&self, device: &str) -> CoreResult<()>;

    /// Whether the device is still executing a command.
    async fn device_busy(&self, device: &str) -> CoreResult<bool>;

    /// Block until the device reports idle.
    async fn wait_for_device(&self, device: &str) -> CoreResult<()>;

    // --- properties ---

    /// Read a property as its string encoding.
    async fn get_property(&self, device: &str, property: &str) -> CoreResult<String>;

    /// Write a property from its string encoding.
    async fn set_property(&self, device: &str, property: &str, value: &str) -> CoreResult<()>;

    /// Names of every property the device exposes.
    async fn device_property_names(&self, device: &str) -> CoreResult<Vec<String>>;

    /// Whether the device exposes `property`.
    async fn has_property(&self, device: &str, property: &str) -> CoreResult<bool>;

    /// Whether `property` can only be read.
    async fn is_property_read_only(&self, device: &str, property: &str) -> CoreResult<bool>;

    /// The allowed values of an enumerated property; empty if unrestricted.
    async fn allowed_property_values(&self, device: &str, property: &str)
        -> CoreResult<Vec<String>>;

    /// `(lower, upper)` limits of a numeric property, if it has any.
    async fn property_limits(&self, device: &str, property: &str) -> CoreResult<Option<(f64, f64)>>;

    /// Declared type of `property`.
    async fn property_type(&self, device: &str, property: &str) -> CoreResult<PropertyType>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("focus".parse::<DeviceRole>().unwrap(), DeviceRole::Focus);
        assert_eq!("XY-Stage".parse::<DeviceRole>().unwrap(), DeviceRole::XYStage);
        assert_eq!("xystage".parse::<DeviceRole>().unwrap(), DeviceRole::XYStage);
        assert_eq!("AutoFocus".parse::<DeviceRole>().unwrap(), DeviceRole::AutoFocus);

        let err = "lamp".parse::<DeviceRole>().unwrap_err();
        assert!(err.contains("focus"));
    }

    #[test]
    fn test_role_labels_round_trip() {
        for role in DeviceRole::ALL {
            assert_eq!(role.label().parse::<DeviceRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_device_name_rejects_blank() {
        assert!(DeviceName::new("").is_none());
        assert!(DeviceName::new("   ").is_none());
        assert_eq!(DeviceName::new("ZStage").unwrap().as_str(), "ZStage");
    }
}
