//! Error types for the accessor layer.
//!
//! Two layers of errors live here:
//!
//! - **`CoreError`**: what a [`ControlCore`](crate::control::ControlCore) reports when a
//!   hardware call fails. It carries a [`CoreErrorKind`] so the accessor layer can
//!   classify the failure without parsing messages.
//! - **`AccessError`**: what the accessor layer hands back to UI and orchestration
//!   code. Every core failure is converted into one of its variants at the facade
//!   boundary; nothing above the facade ever sees a `CoreError` directly.
//!
//! ## Taxonomy
//!
//! | Variant              | Meaning                                                        |
//! |----------------------|----------------------------------------------------------------|
//! | `Comm`               | The core call failed (timeout, device fault, disconnected)     |
//! | `NotFound`           | The device or property does not exist                          |
//! | `InvalidValue`       | The core rejected a write (out of range, not allowed, read-only) |
//! | `Parse`              | A string-encoded value could not be decoded to the wanted type |
//! | `NoDeviceConfigured` | No device is assigned to the requested role                    |
//! | `DeviceNotResolved`  | A facade operation ran before `find_device` succeeded          |
//! | `WaitTimedOut`       | A bounded wait for an idle device expired                      |
//! | `Cancelled`          | A wait was cancelled by its caller                             |
//!
//! Only `Comm` is transient. The rest describe configuration or input problems that
//! retrying will not fix.

use std::time::Duration;
use thiserror::Error;

use crate::codec::ValueKind;
use crate::control::DeviceRole;

// =============================================================================
// Core Errors
// =============================================================================

/// Classification of a failed control core call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorKind {
    /// No device is loaded under the given label.
    UnknownDevice,
    /// The device has no property with the given name.
    UnknownProperty,
    /// The device refused the value (not in the allowed set or outside limits).
    InvalidPropertyValue,
    /// The property cannot be written.
    ReadOnlyProperty,
    /// The value contains characters the core cannot store.
    InvalidContents,
    /// The core gave up waiting for the device to become idle.
    PollingTimeout,
    /// The link to the device failed.
    Communication,
    /// The device reported a fault.
    Hardware,
    /// Anything the core could not classify.
    Generic,
}

impl std::fmt::Display for CoreErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CoreErrorKind::UnknownDevice => "unknown_device",
            CoreErrorKind::UnknownProperty => "unknown_property",
            CoreErrorKind::InvalidPropertyValue => "invalid_property_value",
            CoreErrorKind::ReadOnlyProperty => "read_only_property",
            CoreErrorKind::InvalidContents => "invalid_contents",
            CoreErrorKind::PollingTimeout => "polling_timeout",
            CoreErrorKind::Communication => "communication",
            CoreErrorKind::Hardware => "hardware",
            CoreErrorKind::Generic => "generic",
        };
        write!(f, "{}", label)
    }
}

/// A failure reported by the control core.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("core {kind} error{}: {message}", device_suffix(.device))]
pub struct CoreError {
    /// Label of the device involved, when the core knows it.
    pub device: Option<String>,
    /// Failure classification.
    pub kind: CoreErrorKind,
    /// Human readable description from the core or device adapter.
    pub message: String,
}

fn device_suffix(device: &Option<String>) -> String {
    match device {
        Some(name) => format!(" on '{}'", name),
        None => String::new(),
    }
}

impl CoreError {
    /// Create an error without a device label.
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            device: None,
            kind,
            message: message.into(),
        }
    }

    /// Create an error attributed to a device.
    pub fn for_device(
        device: impl Into<String>,
        kind: CoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            device: Some(device.into()),
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// Parse Failures
// =============================================================================

/// A property value that could not be decoded to the requested type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot decode {raw:?} as {expected}")]
pub struct ParseFailure {
    /// The raw string the core returned.
    pub raw: String,
    /// The type the caller asked for.
    pub expected: ValueKind,
}

impl ParseFailure {
    /// Create a parse failure for `raw`.
    pub fn new(raw: impl Into<String>, expected: ValueKind) -> Self {
        Self {
            raw: raw.into(),
            expected,
        }
    }
}

// =============================================================================
// Access Errors
// =============================================================================

/// Convenience alias for results of accessor and facade operations.
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Failure returned by the accessor layer.
///
/// Callers decide what to do with it: retry, surface a UI error, or substitute a
/// default of their own choosing. The accessor layer never substitutes a default
/// value for a failed read.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The underlying hardware/core call failed.
    ///
    /// **Error Type**: Transient. A retry may succeed once the link recovers.
    #[error("communication error on '{device}' during {operation}: {message}")]
    Comm {
        /// Device label (empty if the failure happened before a device was known).
        device: String,
        /// Name of the accessor operation that failed.
        operation: &'static str,
        /// Core message.
        message: String,
    },

    /// The device, or a property on it, does not exist.
    #[error("{}", not_found_message(.device, .property))]
    NotFound {
        /// Device label.
        device: String,
        /// Property name, if the lookup was for a property.
        property: Option<String>,
    },

    /// The core rejected a write.
    ///
    /// **Error Type**: Permanent for this value. Query
    /// [`PropertyAccessor::describe`](crate::accessor::PropertyAccessor::describe) for
    /// the allowed values or limits.
    #[error("'{device}' rejected {property} = {value:?}: {reason}")]
    InvalidValue {
        /// Device label.
        device: String,
        /// Property (or axis) that was written.
        property: String,
        /// Encoded value that was refused.
        value: String,
        /// Core message.
        reason: String,
    },

    /// A property value could not be decoded.
    #[error("'{device}' property {property}: {source}")]
    Parse {
        /// Device label.
        device: String,
        /// Property name.
        property: String,
        /// Decode failure.
        #[source]
        source: ParseFailure,
    },

    /// Role resolution found no device assigned to the role.
    #[error("no {role} device configured")]
    NoDeviceConfigured {
        /// Role that was queried.
        role: DeviceRole,
    },

    /// A facade operation was invoked before `find_device` succeeded.
    #[error("{role} device has not been resolved; call find_device first")]
    DeviceNotResolved {
        /// Role the facade is bound to.
        role: DeviceRole,
    },

    /// A bounded wait for the device to become idle expired.
    #[error("'{device}' still busy after {waited:?}")]
    WaitTimedOut {
        /// Device label.
        device: String,
        /// How long the caller was willing to wait.
        waited: Duration,
    },

    /// The caller cancelled a wait.
    #[error("wait for '{device}' cancelled")]
    Cancelled {
        /// Device label.
        device: String,
    },
}

fn not_found_message(device: &str, property: &Option<String>) -> String {
    match property {
        Some(name) => format!("device '{}' has no property '{}'", device, name),
        None => format!("device '{}' not found", device),
    }
}

impl AccessError {
    /// Whether retrying the same operation could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AccessError::Comm { .. })
    }

    /// Convert a core failure on a read or motion call.
    ///
    /// Rejections are not expected on these paths, so anything other than a
    /// missing device/property is reported as a communication failure.
    pub fn from_core(err: CoreError, device: &str, operation: &'static str) -> Self {
        match err.kind {
            CoreErrorKind::UnknownDevice => AccessError::NotFound {
                device: device.to_string(),
                property: None,
            },
            _ => AccessError::Comm {
                device: device.to_string(),
                operation,
                message: err.message,
            },
        }
    }

    /// Convert a core failure on a property read.
    pub fn from_core_read(err: CoreError, device: &str, property: &str) -> Self {
        match err.kind {
            CoreErrorKind::UnknownProperty => AccessError::NotFound {
                device: device.to_string(),
                property: Some(property.to_string()),
            },
            _ => Self::from_core(err, device, "get_property"),
        }
    }

    /// Convert a core failure on a property (or position) write.
    ///
    /// Value rejections become [`AccessError::InvalidValue`], kept apart from
    /// communication failures. Anything else is reported against `operation`.
    pub fn from_core_write(
        err: CoreError,
        device: &str,
        operation: &'static str,
        property: &str,
        value: &str,
    ) -> Self {
        match err.kind {
            CoreErrorKind::InvalidPropertyValue
            | CoreErrorKind::ReadOnlyProperty
            | CoreErrorKind::InvalidContents => AccessError::InvalidValue {
                device: device.to_string(),
                property: property.to_string(),
                value: value.to_string(),
                reason: err.message,
            },
            CoreErrorKind::UnknownProperty => AccessError::NotFound {
                device: device.to_string(),
                property: Some(property.to_string()),
            },
            _ => Self::from_core(err, device, operation),
        }
    }
}
