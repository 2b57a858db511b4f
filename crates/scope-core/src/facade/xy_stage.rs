//! XY stage facade.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use super::{check_finite, DeviceHandle};
use crate::cancel::CancelToken;
use crate::config::AccessorConfig;
use crate::control::{ControlCore, DeviceName, DeviceRole};
use crate::error::{AccessError, AccessResult};
use crate::error_recovery::retry_transient;

/// XY stage position in µm.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct XyPosition {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl XyPosition {
    /// Create a position.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for XyPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Two axis stage bound to the active XY stage device.
#[derive(Debug)]
pub struct XyStage {
    handle: DeviceHandle,
}

impl XyStage {
    /// Create an unresolved facade with default settings.
    pub fn new(core: Arc<dyn ControlCore>) -> Self {
        Self::with_config(core, &AccessorConfig::default())
    }

    /// Create an unresolved facade.
    pub fn with_config(core: Arc<dyn ControlCore>, config: &AccessorConfig) -> Self {
        Self {
            handle: DeviceHandle::new(DeviceRole::XYStage, core, config),
        }
    }

    /// Shared binding state and generic operations.
    pub fn handle(&self) -> &DeviceHandle {
        &self.handle
    }

    /// Resolve the XY stage role and cache the device name.
    pub async fn find_device(&self) -> AccessResult<DeviceName> {
        self.handle.find_device().await
    }

    /// Cached device name.
    pub fn device_name(&self) -> AccessResult<DeviceName> {
        self.handle.device_name()
    }

    /// Move to an absolute position.
    #[instrument(skip(self), fields(role = "xy_stage"))]
    pub async fn set_xy_position(&self, target: XyPosition) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            check_finite(&device, "x", target.x)?;
            check_finite(&device, "y", target.y)?;
            self.handle
                .core()
                .set_xy_position(device.as_str(), target.x, target.y)
                .await
                .map_err(|e| {
                    AccessError::from_core_write(
                        e,
                        device.as_str(),
                        "set_xy_position",
                        "xy_position",
                        &target.to_string(),
                    )
                })
        }
        .await;
        self.handle.report("set_xy_position", result)
    }

    /// Move by `(dx, dy)`.
    #[instrument(skip(self), fields(role = "xy_stage"))]
    pub async fn set_relative_xy_position(&self, dx: f64, dy: f64) -> AccessResult<()> {
        let result = async {
            let device = self.handle.device_name()?;
            check_finite(&device, "x", dx)?;
            check_finite(&device, "y", dy)?;
            self.handle
                .core()
                .set_relative_xy_position(device.as_str(), dx, dy)
                .await
                .map_err(|e| {
                    AccessError::from_core_write(
                        e,
                        device.as_str(),
                        "set_relative_xy_position",
                        "xy_position",
                        &XyPosition::new(dx, dy).to_string(),
                    )
                })
        }
        .await;
        self.handle.report("set_relative_xy_position", result)
    }

    /// Current position.
    #[instrument(skip(self), fields(role = "xy_stage"))]
    pub async fn get_xy_position(&self) -> AccessResult<XyPosition> {
        let result = async {
            let device = self.handle.device_name()?;
            let core = self.handle.core();
            let label = device.as_str();
            retry_transient(
                self.handle.accessor().retry_policy(),
                "get_xy_position",
                || async move {
                    core.get_xy_position(label)
                        .await
                        .map(|(x, y)| XyPosition::new(x, y))
                        .map_err(|e| AccessError::from_core(e, label, "get_xy_position"))
                },
            )
            .await
        }
        .await;
        self.handle.report("get_xy_position", result)
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

    /// Halt motion on both axes.
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
}
