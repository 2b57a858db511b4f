//! Application wiring: one control core, shared by every facade.

use scope_core::{
    AccessResult, AccessorConfig, DeviceResolver, DeviceRole, PropertyAccessor, PropertyInfo,
    SerializedCore, XyStage, ZStage,
};
use scope_driver_mock::MockCore;
use std::sync::Arc;

use crate::config::AppConfig;

/// A control core plus the accessor configuration facades are built with.
///
/// The core is wrapped in [`SerializedCore`] so the CLI and any background
/// task can share it.
pub struct Microscope {
    core: Arc<SerializedCore<MockCore>>,
    accessor_config: AccessorConfig,
}

impl Microscope {
    /// Build the simulated core described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, String> {
        let mock = MockCore::from_config(&config.mock)?;
        tracing::info!(
            mode = ?mock.mode(),
            devices = config.mock.devices.len(),
            "mock control core loaded"
        );
        Ok(Self::with_core(mock, config.accessor.clone()))
    }

    /// Wrap an existing mock core.
    pub fn with_core(core: MockCore, accessor_config: AccessorConfig) -> Self {
        Self {
            core: Arc::new(SerializedCore::new(core)),
            accessor_config,
        }
    }

    /// The underlying mock, for test controls such as role reassignment.
    pub fn mock(&self) -> &MockCore {
        self.core.inner()
    }

    /// Accessor settings in effect.
    pub fn accessor_config(&self) -> &AccessorConfig {
        &self.accessor_config
    }

    /// Unresolved focus stage facade.
    pub fn focus(&self) -> ZStage {
        ZStage::with_config(self.core.clone(), &self.accessor_config)
    }

    /// Unresolved XY stage facade.
    pub fn xy_stage(&self) -> XyStage {
        XyStage::with_config(self.core.clone(), &self.accessor_config)
    }

    /// Role resolver over the shared core.
    pub fn resolver(&self) -> DeviceResolver {
        DeviceResolver::new(self.core.clone())
    }

    /// Property accessor over the shared core.
    pub fn accessor(&self) -> PropertyAccessor {
        PropertyAccessor::with_retry(self.core.clone(), self.accessor_config.retry_policy())
    }

    /// Every loaded device with the roles it currently holds.
    pub async fn inventory(&self) -> AccessResult<Vec<(String, Vec<DeviceRole>)>> {
        let resolver = self.resolver();
        let mut assigned = Vec::new();
        for role in DeviceRole::ALL {
            // Unassigned roles are expected here, not an error.
            if let Ok(name) = resolver.resolve(role).await {
                assigned.push((name.to_string(), role));
            }
        }

        Ok(resolver
            .loaded_devices()
            .await?
            .into_iter()
            .map(|label| {
                let roles = assigned
                    .iter()
                    .filter(|(name, _)| *name == label)
                    .map(|(_, role)| *role)
                    .collect();
                (label, roles)
            })
            .collect())
    }

    /// Metadata and current value of every property on `device`.
    pub async fn describe_device(&self, device: &str) -> AccessResult<Vec<(PropertyInfo, String)>> {
        let accessor = self.accessor();
        let mut described = Vec::new();
        for name in accessor.property_names(device).await? {
            let info = accessor.describe(device, &name).await?;
            let value = accessor.get_property(device, &name).await?;
            described.push((info, value));
        }
        Ok(described)
    }
}

impl std::fmt::Debug for Microscope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Microscope")
            .field("accessor_config", &self.accessor_config)
            .finish_non_exhaustive()
    }
}
