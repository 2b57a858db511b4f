//! Focus (Z) stage facade.

use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use super::{check_finite, DeviceHandle};
use crate::cancel::CancelToken;
use crate::config::AccessorConfig;
use crate::control::{ControlCore, DeviceName, DeviceRole};
use crate::error::{AccessError, AccessResult};
use crate::error_recovery::retry_transient;

/// Single axis translation stage bound to the active focus device.
///
/// # Example
///
/// ```rust,ignore
/// let stage = ZStage::new(core.clone());
/// stage.find_device().await?;
///
/// stage.set_position(100.0).await?;
/// stage.wait_for_device(Duration::from_secs(5)).await?;
/// let z = stage.get_position().await?;
/// ```
#[derive(Debug)]
pub struct ZStage {
    handle: DeviceHandle,
    backlash_property: String,
}

impl ZStage {
    /// Create an unresolved facade with default settings.
    pub fn new(core: Arc<dyn ControlCore>) -> Self {
        Self::with_config(core, &AccessorConfig::default())
    }

    /// Create an unresolved facade.
    pub fn with_config(core: Arc<dyn ControlCore>, config: &AccessorConfig) -> Self {
        Self {
            handle: DeviceHandle::new(DeviceRole::Focus, core, config),
            backlash_property: config.backlash_property.clone(),
        }
    }

    /// Shared binding state and generic operations.
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Resolve the focus role and cache the device name.
    pub async fn find_device(&self) -> AccessResult<DeviceName> {
        self.handle.find_device().await
    }

    /// Cached device name.
    pub fn device_name(&self) -> AccessResult<DeviceName> {
        self.handle.device_name()
    }

    /// Move to an absolute position (µm).
    #[instrument(skip(self), fields(role = "focus"))]
    pub async fn set_position(&self, position: f64) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            check_finite(&device, "position", position)?;
            self.handle
                .core()
                .set_position(device.as_str(), position)
                .await
                .map_err(|e| {
                    AccessError::from_core_write(
                        e,
                        device.as_str(),
                        "set_position",
                        "position",
                        &position.to_string(),
                    )
                })
        }
        .await;
        self.handle.report("set_position", result)
    }

    /// Move by `delta` µm from the current position.
    #[instrument(skip(self), fields(role = "focus"))]
    pub async fn set_relative_position(&self, delta: f64) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            check_finite(&device, "position", delta)?;
            self.handle
                .core()
                .set_relative_position(device.as_str(), delta)
                .await
                .map_err(|e| {
                    AccessError::from_core_write(
                        e,
                        device.as_str(),
                        "set_relative_position",
                        "position",
                        &delta.to_string(),
                    )
                })
        }
        .await;
        self.handle.report("set_relative_position", result)
    }

    /// Current position (µm).
    ///
    /// A failed read is an error, never a `0.0` that could pass for a real
    /// position.
    #[instrument(skip(self), fields(role = "focus"))]
    pub async fn get_position(&self) -> AccessResult<f64> {
        let result = async {
            let device = self.handle.device_name()?;
            let core = self.handle.core();
            let label = device.as_str();
            retry_transient(
                self.handle.accessor().retry_policy(),
                "get_position",
                || async move {
                    core.get_position(label)
                        .await
                        .map_err(|e| AccessError::from_core(e, label, "get_position"))
                },
            )
            .await
        }
        .await;
        self.handle.report("get_position", result)
    }

    /// Wait until the stage is idle, for at most `timeout`.
    pub async fn wait_for_device(&self, timeout: Duration) -> AccessResult<()> {
        self.handle.wait_for_device(timeout).await
    }

    /// Wait until the stage is idle, bounded by `timeout` and `cancel`.
    pub async fn wait_for_device_until(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> AccessResult<()> {
        self.handle.wait_for_device_until(timeout, cancel).await
    }

    /// Whether the stage is moving.
    pub async fn is_busy(&self) -> AccessResult<bool> {
        self.handle.is_busy().await
    }

    /// Halt motion.
    #[instrument(skip(self), fields(role = "focus"))]
    pub async fn stop(&self) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            self.handle
                .core()
                .stop(device.as_str())
                .await
                .map_err(|e| AccessError::from_core(e, device.as_str(), "stop"))
        }
        .await;
        self.handle.report("stop", result)
    }

    /// Run the homing procedure.
    #[instrument(skip(self), fields(role = "focus"))]
    pub async fn home(&self) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            self.handle
                .core()
                .home(device.as_str())
                .await
                .map_err(|e| AccessError::from_core(e, device.as_str(), "home"))
        }
        .await;
        self.handle.report("home", result)
    }

    /// Backlash compensation (µm).
    pub async fn get_backlash(&self) -> AccessResult<f32> {
        let result = async {
            let device = self.handle.device_name()?;
            self.handle
                .accessor()
                .get::<f32>(device.as_str(), &self.backlash_property)
                .await
        }
        .await;
        self.handle.report("get_backlash", result)
    }

    /// Set backlash compensation (µm).
    pub async fn set_backlash(&self, backlash: f32) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            self.handle
                .accessor()
                .set(device.as_str(), &self.backlash_property, &backlash)
                .await
        }
        .await;
        self.handle.report("set_backlash", result)
    }

    /// Property key used for backlash.
    pub fn backlash_property(&self) -> &str {
        &self.backlash_property
    }

    /// Names of every property on the stage.
    pub async fn property_names(&self) -> AccessResult<Vec<String>> {
        self.handle.property_names().await
    }
}
