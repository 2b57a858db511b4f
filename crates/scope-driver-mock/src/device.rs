//! Device and property descriptions for the mock core.
//!
//! Both types deserialize from the `[mock]` section of a TOML config:
//!
//! ```toml
//! [[devices]]
//! label = "ZStage"
//! kind = "stage"
//! roles = ["focus"]
//! travel = [-5000.0, 5000.0]
//!
//! [[devices.properties]]
//! name = "Backlash-B(um)"
//! value = "1.5"
//! kind = "float"
//! limits = [0.0, 10.0]
//! ```

use scope_core::{DeviceRole, PropertyType};
use serde::{Deserialize, Serialize};

/// What motion calls a device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Single axis stage.
    Stage,
    /// Two axis stage.
    XyStage,
    /// Properties only.
    #[default]
    Generic,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::Stage => write!(f, "stage"),
            DeviceKind::XyStage => write!(f, "XY stage"),
            DeviceKind::Generic => write!(f, "generic device"),
        }
    }
}

/// A device property with its current value and constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockProperty {
    /// Property name.
    pub name: String,
    /// Current value, string encoded.
    pub value: String,
    /// Declared type.
    #[serde(default)]
    pub kind: PropertyType,
    /// Allowed values; empty means unrestricted.
    #[serde(default)]
    pub allowed: Vec<String>,
    /// Numeric bounds, inclusive.
    #[serde(default)]
    pub limits: Option<(f64, f64)>,
    /// Whether writes are refused.
    #[serde(default)]
    pub read_only: bool,
}

impl MockProperty {
    /// Free text property.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            kind: PropertyType::String,
            allowed: Vec::new(),
            limits: None,
            read_only: false,
        }
    }

    /// Floating point property.
    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self {
            kind: PropertyType::Float,
            ..Self::text(name, value.to_string())
        }
    }

    /// Integer property.
    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self {
            kind: PropertyType::Integer,
            ..Self::text(name, value.to_string())
        }
    }

    /// Restrict writes to `values`.
    pub fn with_allowed<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = values.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict writes to `[low, high]`.
    pub fn with_limits(mut self, low: f64, high: f64) -> Self {
        self.limits = Some((low, high));
        self
    }

    /// Refuse writes.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Why `value` would be refused, if it would.
    pub(crate) fn rejection(&self, value: &str) -> Option<String> {
        if !self.allowed.is_empty() && !self.allowed.iter().any(|v| v == value) {
            return Some(format!(
                "\"{}\" is not one of [{}]",
                value,
                self.allowed.join(", ")
            ));
        }

        let numeric = match self.kind {
            PropertyType::Float => Some(value.trim().parse::<f64>().ok()),
            PropertyType::Integer => Some(value.trim().parse::<i64>().ok().map(|v| v as f64)),
            PropertyType::String | PropertyType::Undefined => None,
        };
        if let Some(None) = numeric {
            return Some(format!("\"{}\" is not a valid {:?} value", value, self.kind));
        }

        if let Some((low, high)) = self.limits {
            let parsed = match numeric {
                Some(parsed) => parsed,
                None => value.trim().parse::<f64>().ok(),
            };
            match parsed {
                Some(v) if v >= low && v <= high => {}
                Some(v) => return Some(format!("{} is outside [{}, {}]", v, low, high)),
                None => return Some(format!("\"{}\" is not a number", value)),
            }
        }
        None
    }
}

/// A loaded device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDevice {
    /// Device label.
    pub label: String,
    /// Motion capability.
    #[serde(default)]
    pub kind: DeviceKind,
    /// Single axis position (µm).
    #[serde(default)]
    pub position: f64,
    /// XY position (µm).
    #[serde(default)]
    pub xy: (f64, f64),
    /// Travel range per axis, inclusive (µm).
    #[serde(default)]
    pub travel: Option<(f64, f64)>,
    /// Roles this device holds at startup.
    #[serde(default)]
    pub roles: Vec<DeviceRole>,
    /// Properties in declaration order.
    #[serde(default)]
    pub properties: Vec<MockProperty>,
}

impl MockDevice {
    fn with_kind(label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            label: label.into(),
            kind,
            position: 0.0,
            xy: (0.0, 0.0),
            travel: None,
            roles: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Single axis stage.
    pub fn stage(label: impl Into<String>) -> Self {
        Self::with_kind(label, DeviceKind::Stage)
    }

    /// Two axis stage.
    pub fn xy_stage(label: impl Into<String>) -> Self {
        Self::with_kind(label, DeviceKind::XyStage)
    }

    /// Property-only device.
    pub fn generic(label: impl Into<String>) -> Self {
        Self::with_kind(label, DeviceKind::Generic)
    }

    /// Add a property.
    pub fn with_property(mut self, property: MockProperty) -> Self {
        self.properties.push(property);
        self
    }

    /// Hold `role` at startup.
    pub fn with_role(mut self, role: DeviceRole) -> Self {
        self.roles.push(role);
        self
    }

    /// Start at `position`.
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// Start at `(x, y)`.
    pub fn with_xy(mut self, x: f64, y: f64) -> Self {
        self.xy = (x, y);
        self
    }

    /// Limit travel to `[low, high]` on every axis.
    pub fn with_travel(mut self, low: f64, high: f64) -> Self {
        self.travel = Some((low, high));
        self
    }

    pub(crate) fn property(&self, name: &str) -> Option<&MockProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut MockProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    pub(crate) fn out_of_travel(&self, target: f64) -> Option<String> {
        match self.travel {
            Some((low, high)) if target < low || target > high => Some(format!(
                "target {} is outside travel range [{}, {}]",
                target, low, high
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_values() {
        let binning = MockProperty::text("Binning", "1").with_allowed(["1", "2", "4"]);
        assert!(binning.rejection("2").is_none());
        assert!(binning.rejection("3").unwrap().contains("not one of"));
    }

    #[test]
    fn test_numeric_limits() {
        let backlash = MockProperty::float("Backlash-B(um)", 1.5).with_limits(0.0, 10.0);
        assert!(backlash.rejection("2.25").is_none());
        assert!(backlash.rejection("10").is_none());
        assert!(backlash.rejection("10.5").unwrap().contains("outside"));
        assert!(backlash.rejection("abc").is_some());
    }

    #[test]
    fn test_integer_type_rejects_fraction() {
        let gain = MockProperty::integer("Gain", 1);
        assert!(gain.rejection("4").is_none());
        assert!(gain.rejection("4.5").is_some());
    }

    #[test]
    fn test_untyped_limits_parse_value() {
        let mut prop = MockProperty::text("Speed", "1");
        prop.limits = Some((0.0, 5.0));
        assert!(prop.rejection("3").is_none());
        assert!(prop.rejection("fast").unwrap().contains("not a number"));
    }

    #[test]
    fn test_travel_range() {
        let stage = MockDevice::stage("ZStage").with_travel(-100.0, 100.0);
        assert!(stage.out_of_travel(50.0).is_none());
        assert!(stage.out_of_travel(150.0).is_some());
        assert!(MockDevice::stage("Free").out_of_travel(1e9).is_none());
    }

    #[test]
    fn test_device_from_toml() {
        let device: MockDevice = toml::from_str(
            r#"
label = "ZStage"
kind = "stage"
roles = ["focus"]
travel = [-5000.0, 5000.0]

[[properties]]
name = "Backlash-B(um)"
value = "1.5"
kind = "float"
limits = [0.0, 10.0]
"#,
        )
        .unwrap();

        assert_eq!(device.kind, DeviceKind::Stage);
        assert_eq!(device.travel, Some((-5000.0, 5000.0)));
        assert_eq!(device.roles, vec![DeviceRole::Focus]);
        let backlash = device.property("Backlash-B(um)").unwrap();
        assert_eq!(backlash.kind, PropertyType::Float);
        assert_eq!(backlash.limits, Some((0.0, 10.0)));
        assert!(!backlash.read_only);
    }
}
