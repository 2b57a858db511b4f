//! Typed device facades.
//!
//! A facade binds a [`DeviceRole`] to a concrete device and exposes domain
//! operations on it. Every facade follows the same shape: resolve once, read and
//! write many, never fail past the boundary other than with an [`AccessError`].
//!
//! # Binding state
//!
//! ```text
//!            find_device() ok
//! Unresolved ───────────────────▶ Resolved(name)
//!     ▲                               │  │
//!     │   find_device() err /         │  │ find_device() ok
//!     └──────── invalidate() ─────────┘  └──▶ Resolved(new name)
//! ```
//!
//! While unresolved, every device operation fails fast with
//! [`AccessError::DeviceNotResolved`]. No call reaches the core with an empty
//! device label.
//!
//! # Logging
//!
//! Each failed operation is logged once, at `WARN`, by the facade that observed
//! it, and then returned to the caller.

mod stage;
mod xy_stage;

pub use stage::ZStage;
pub use xy_stage::{XyPosition, XyStage};

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::accessor::PropertyAccessor;
use crate::cancel::CancelToken;
use crate::config::AccessorConfig;
use crate::control::{ControlCore, DeviceName, DeviceRole};
use crate::error::{AccessError, AccessResult};
use crate::error_recovery::retry_transient;
use crate::resolver::DeviceResolver;

/// Role binding and the operations every facade shares.
pub struct DeviceHandle {
    role: DeviceRole,
    resolver: DeviceResolver,
    accessor: PropertyAccessor,
    binding: RwLock<Option<DeviceName>>,
    wait_timeout: Duration,
}

impl DeviceHandle {
    /// Create an unresolved handle for `role`.
    pub fn new(role: DeviceRole, core: Arc<dyn ControlCore>, config: &AccessorConfig) -> Self {
        Self {
            role,
            resolver: DeviceResolver::new(core.clone()),
            accessor: PropertyAccessor::with_retry(core, config.retry_policy()),
            binding: RwLock::new(None),
            wait_timeout: config.wait_timeout(),
        }
    }

    /// Role this handle is bound to.
    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Property accessor sharing this handle's core and retry policy.
    pub fn accessor(&self) -> &PropertyAccessor {
        &self.accessor
    }

    /// The core every call is routed through.
    pub fn core(&self) -> &Arc<dyn ControlCore> {
        self.accessor.core()
    }

    /// Configured default bound for waits.
    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Resolve the role and cache the device name.
    ///
    /// Re-enterable: call it again after any configuration change. A failed
    /// resolution leaves the handle unresolved, so stale names are never used.
    pub async fn find_device(&self) -> AccessResult<DeviceName> {
        match self.resolver.resolve(self.role).await {
            Ok(name) => {
                let previous = self.binding.write().replace(name.clone());
                if previous.as_ref() != Some(&name) {
                    tracing::info!(role = %self.role, device = %name, "device bound");
                }
                Ok(name)
            }
            Err(err) => {
                self.binding.write().take();
                tracing::warn!(role = %self.role, error = %err, "find_device failed");
                Err(err)
            }
        }
    }

    /// Cached device name.
    ///
    /// # Errors
    /// [`AccessError::DeviceNotResolved`] before a successful `find_device`.
    pub fn device_name(&self) -> AccessResult<DeviceName> {
        self.binding
            .read()
            .clone()
            .ok_or(AccessError::DeviceNotResolved { role: self.role })
    }

    /// Whether a device name is cached.
    pub fn is_resolved(&self) -> bool {
        self.binding.read().is_some()
    }

    /// Drop the cached device name.
    pub fn invalidate(&self) {
        if self.binding.write().take().is_some() {
            tracing::debug!(role = %self.role, "device binding invalidated");
        }
    }

    /// Whether the device is still executing a command.
    pub async fn is_busy(&self) -> AccessResult<bool> {
        let result = self.is_busy_inner().await;
        self.report("is_busy", result)
    }

    async fn is_busy_inner(&self) -> AccessResult<bool> {
        let device = self.device_name()?;
        let core = self.core();
        let label = device.as_str();
        retry_transient(self.accessor.retry_policy(), "device_busy", || async move {
            core.device_busy(label)
                .await
                .map_err(|e| AccessError::from_core(e, label, "device_busy"))
        })
        .await
    }

    /// Wait until the device is idle, for at most `timeout`.
    pub async fn wait_for_device(&self, timeout: Duration) -> AccessResult<()> {
        self.wait_for_device_until(timeout, &CancelToken::new())
            .await
    }

    /// Wait until the device is idle, for at most `timeout`, or until `cancel`
    /// fires.
    ///
    /// # Errors
    /// - [`AccessError::WaitTimedOut`] when `timeout` expires first
    /// - [`AccessError::Cancelled`] when `cancel` fires first
    /// - [`AccessError::Comm`] when the core's own wait fails
    pub async fn wait_for_device_until(
        &self,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> AccessResult<()> {
        let result = self.wait_inner(timeout, cancel).await;
        self.report("wait_for_device", result)
    }

    async fn wait_inner(&self, timeout: Duration, cancel: &CancelToken) -> AccessResult<()> {
        let device = self.device_name()?;
        let label = device.as_str();
        if cancel.is_cancelled() {
            return Err(AccessError::Cancelled {
                device: label.to_string(),
            });
        }

        tracing::trace!(device = label, ?timeout, "waiting for device");
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AccessError::Cancelled {
                device: label.to_string(),
            }),
            waited = tokio::time::timeout(timeout, self.core().wait_for_device(label)) => {
                match waited {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(AccessError::from_core(e, label, "wait_for_device")),
                    Err(_) => Err(AccessError::WaitTimedOut {
                        device: label.to_string(),
                        waited: timeout,
                    }),
                }
            }
        }
    }

    /// Names of every property on the bound device.
    pub async fn property_names(&self) -> AccessResult<Vec<String>> {
        let result = match self.device_name() {
            Ok(device) => self.accessor.property_names(device.as_str()).await,
            Err(err) => Err(err),
        };
        self.report("property_names", result)
    }

    /// Log a failed operation once and hand the result back unchanged.
    pub(crate) fn report<T>(&self, operation: &'static str, result: AccessResult<T>) -> AccessResult<T> {
        if let Err(err) = &result {
            let device = self
                .binding
                .read()
                .as_ref()
                .map(|name| name.to_string())
                .unwrap_or_default();
            tracing::warn!(role = %self.role, device, operation, error = %err, "device operation failed");
        }
        result
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("role", &self.role)
            .field("binding", &*self.binding.read())
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

/// Reject positions the core cannot represent before they reach it.
pub(crate) fn check_finite(device: &DeviceName, axis: &str, value: f64) -> AccessResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AccessError::InvalidValue {
            device: device.to_string(),
            property: axis.to_string(),
            value: value.to_string(),
            reason: "position must be a finite number".to_string(),
        })
    }
}
