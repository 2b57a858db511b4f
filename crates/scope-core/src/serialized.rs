//! Mutual exclusion around a control core.
//!
//! The accessor layer requires `ControlCore: Send + Sync` and adds no locking of
//! its own. Bindings to runtimes that are not safe to call from several threads at
//! once (a UI task and a background acquisition task, say) wrap the core in
//! [`SerializedCore`], which lets one call through at a time.
//!
//! `wait_for_device` is the exception to "hold the lock for the whole call": it
//! polls `device_busy` and takes the lock once per poll, so a `stop` issued by
//! another task gets through while a long wait is in progress. Once the device
//! reads idle it calls the inner core's own `wait_for_device`, so failures the
//! core reports from its wait still reach the caller.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::control::{ControlCore, CoreResult, DeviceRole, PropertyType};

/// Default busy polling cadence (the core's own 10 ms polling interval).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A [`ControlCore`] adapter that serializes every call to the inner core.
pub struct SerializedCore<C> {
    inner: C,
    lock: Mutex<()>,
    poll_interval: Duration,
}

impl<C: ControlCore> SerializedCore<C> {
    /// Wrap `inner`, polling busy state every [`DEFAULT_POLL_INTERVAL`].
    pub fn new(inner: C) -> Self {
        Self::with_poll_interval(inner, DEFAULT_POLL_INTERVAL)
    }

    /// Wrap `inner` with a custom busy polling cadence.
    pub fn with_poll_interval(inner: C, poll_interval: Duration) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
            poll_interval,
        }
    }

    /// The wrapped core.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ControlCore> ControlCore for SerializedCore<C> {
    async fn role_device(&self, role: DeviceRole) -> CoreResult<String> {
        let _guard = self.lock.lock().await;
        self.inner.role_device(role).await
    }

    async fn loaded_devices(&self) -> CoreResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.inner.loaded_devices().await
    }

    async fn set_position(&self, device: &str, position: f64) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.set_position(device, position).await
    }

    async fn set_relative_position(&self, device: &str, delta: f64) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.set_relative_position(device, delta).await
    }

    async fn get_position(&self, device: &str) -> CoreResult<f64> {
        let _guard = self.lock.lock().await;
        self.inner.get_position(device).await
    }

    async fn set_xy_position(&self, device: &str, x: f64, y: f64) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.set_xy_position(device, x, y).await
    }

    async fn set_relative_xy_position(&self, device: &str, dx: f64, dy: f64) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.set_relative_xy_position(device, dx, dy).await
    }

    async fn get_xy_position(&self, device: &str) -> CoreResult<(f64, f64)> {
        let _guard = self.lock.lock().await;
        self.inner.get_xy_position(device).await
    }

    async fn stop(&self, device: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.stop(device).await
    }

    async fn home(&self, device: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.home(device).await
    }

    async fn device_busy(&self, device: &str) -> CoreResult<bool> {
        let _guard = self.lock.lock().await;
        self.inner.device_busy(device).await
    }

    async fn wait_for_device(&self, device: &str) -> CoreResult<()> {
        loop {
            let busy = {
                let _guard = self.lock.lock().await;
                self.inner.device_busy(device).await?
            };
            if !busy {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        // The device is idle; the core's own wait returns at once or reports
        // its failure.
        let _guard = self.lock.lock().await;
        self.inner.wait_for_device(device).await
    }

    async fn get_property(&self, device: &str, property: &str) -> CoreResult<String> {
        let _guard = self.lock.lock().await;
        self.inner.get_property(device, property).await
    }

    async fn set_property(&self, device: &str, property: &str, value: &str) -> CoreResult<()> {
        let _guard = self.lock.lock().await;
        self.inner.set_property(device, property, value).await
    }

    async fn device_property_names(&self, device: &str) -> CoreResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.inner.device_property_names(device).await
    }

    async fn has_property(&self, device: &str, property: &str) -> CoreResult<bool> {
        let _guard = self.lock.lock().await;
        self.inner.has_property(device, property).await
    }

    async fn is_property_read_only(&self, device: &str, property: &str) -> CoreResult<bool> {
        let _guard = self.lock.lock().await;
        self.inner.is_property_read_only(device, property).await
    }

    async fn allowed_property_values(
        &self,
        device: &str,
        property: &str,
    ) -> CoreResult<Vec<String>> {
        let _guard = self.lock.lock().await;
        self.inner.allowed_property_values(device, property).await
    }

    async fn property_limits(&self, device: &str, property: &str) -> CoreResult<Option<(f64, f64)>> {
        let _guard = self.lock.lock().await;
        self.inner.property_limits(device, property).await
    }

    async fn property_type(&self, device: &str, property: &str) -> CoreResult<PropertyType> {
        let _guard = self.lock.lock().await;
        self.inner.property_type(device, property).await
    }
}
