//! Logical role to device name resolution.
//!
//! [`DeviceResolver`] holds no state: each [`resolve`](DeviceResolver::resolve) is
//! one round trip to the core. Caching the answer is the caller's job (facades keep
//! it in their [`DeviceHandle`](crate::facade::DeviceHandle)).
//!
//! Resolution is pull, not push. The core sends no notification when a role is
//! reassigned, so after any configuration change the caller must resolve again.

use std::sync::Arc;

use crate::control::{ControlCore, DeviceName, DeviceRole};
use crate::error::{AccessError, AccessResult};

/// Stateless, idempotent role lookup.
#[derive(Clone)]
pub struct DeviceResolver {
    core: Arc<dyn ControlCore>,
}

impl DeviceResolver {
    /// Create a resolver over `core`.
    pub fn new(core: Arc<dyn ControlCore>) -> Self {
        Self { core }
    }

    /// Ask the core which device currently holds `role`.
    ///
    /// # Errors
    /// - [`AccessError::NoDeviceConfigured`] if the role is unassigned
    /// - [`AccessError::Comm`] if the query itself failed
    pub async fn resolve(&self, role: DeviceRole) -> AccessResult<DeviceName> {
        let label = self
            .core
            .role_device(role)
            .await
            .map_err(|e| AccessError::Comm {
                device: String::new(),
                operation: "resolve",
                message: e.message,
            })?;

        match DeviceName::new(label) {
            Some(name) => {
                tracing::debug!(%role, device = %name, "role resolved");
                Ok(name)
            }
            None => Err(AccessError::NoDeviceConfigured { role }),
        }
    }

    /// Labels of every loaded device.
    pub async fn loaded_devices(&self) -> AccessResult<Vec<String>> {
        self.core
            .loaded_devices()
            .await
            .map_err(|e| AccessError::Comm {
                device: String::new(),
                operation: "loaded_devices",
                message: e.message,
            })
    }
}

impl std::fmt::Debug for DeviceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceResolver").finish_non_exhaustive()
    }
}
