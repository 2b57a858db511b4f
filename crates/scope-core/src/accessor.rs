//! Generic property access with typed coercion and error containment.
//!
//! [`PropertyAccessor`] is the only place that talks to the core about
//! properties. It converts every [`CoreError`](crate::error::CoreError) into an
//! [`AccessError`]. Writes that the core refuses come back as
//! [`AccessError::InvalidValue`]. Link failures come back as [`AccessError::Comm`].
//!
//! Typed reads are explicitly two steps: [`get_property`](PropertyAccessor::get_property)
//! fetches the string, then [`PropertyValue::decode`] turns it into the wanted
//! type. A value that does not decode is an [`AccessError::Parse`], which keeps a
//! caller's last-known-good value intact.
//!
//! # Example
//!
//! ```rust,ignore
//! let accessor = PropertyAccessor::new(core.clone());
//! let backlash: f32 = accessor.get("ZStage", "Backlash-B(um)").await?;
//! accessor.set("ZStage", "Backlash-B(um)", &2.25f32).await?;
//! ```

use serde::Serialize;
use std::sync::Arc;

use crate::codec::PropertyValue;
use crate::control::{ControlCore, PropertyType};
use crate::error::{AccessError, AccessResult, CoreError};
use crate::error_recovery::{retry_transient, RetryPolicy};

/// Everything the core reports about one property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyInfo {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub kind: PropertyType,
    /// Whether writes are refused.
    pub read_only: bool,
    /// Allowed values of an enumerated property; empty if unrestricted.
    pub allowed_values: Vec<String>,
    /// `(lower, upper)` numeric limits, if any.
    pub limits: Option<(f64, f64)>,
}

/// Typed get/set of named properties on named devices.
#[derive(Clone)]
pub struct PropertyAccessor {
    core: Arc<dyn ControlCore>,
    retry: RetryPolicy,
}

impl PropertyAccessor {
    /// Create an accessor that makes a single attempt per read.
    pub fn new(core: Arc<dyn ControlCore>) -> Self {
        Self::with_retry(core, RetryPolicy::none())
    }

    /// Create an accessor that retries transient read failures.
    pub fn with_retry(core: Arc<dyn ControlCore>, retry: RetryPolicy) -> Self {
        Self { core, retry }
    }

    /// The core every call is routed through.
    pub fn core(&self) -> &Arc<dyn ControlCore> {
        &self.core
    }

    /// Read policy in effect.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Read the string encoding of `device`.`property`.
    pub async fn get_property(&self, device: &str, property: &str) -> AccessResult<String> {
        retry_transient(&self.retry, "get_property", || async move {
            self.core
                .get_property(device, property)
                .await
                .map_err(|e| AccessError::from_core_read(e, device, property))
        })
        .await
    }

    /// Write the string encoding of `device`.`property`.
    ///
    /// Never retried.
    pub async fn set_property(&self, device: &str, property: &str, value: &str) -> AccessResult<()> {
        self.core
            .set_property(device, property, value)
            .await
            .map_err(|e| AccessError::from_core_write(e, device, "set_property", property, value))?;
        tracing::debug!(device, property, value, "property set");
        Ok(())
    }

    /// Read and decode a property.
    pub async fn get<T: PropertyValue>(&self, device: &str, property: &str) -> AccessResult<T> {
        let raw = self.get_property(device, property).await?;
        T::decode(&raw).map_err(|source| AccessError::Parse {
            device: device.to_string(),
            property: property.to_string(),
            source,
        })
    }

    /// Encode and write a property.
    ///
    /// Values with no decodable encoding (`NaN`, infinities) are refused as
    /// [`AccessError::InvalidValue`] without calling the core, so whatever is
    /// written can always be read back.
    pub async fn set<T: PropertyValue>(
        &self,
        device: &str,
        property: &str,
        value: &T,
    ) -> AccessResult<()> {
        let encoded = value.encode();
        if let Some(reason) = value.rejection() {
            return Err(AccessError::InvalidValue {
                device: device.to_string(),
                property: property.to_string(),
                value: encoded,
                reason: reason.to_string(),
            });
        }
        self.set_property(device, property, &encoded).await
    }

    /// Read a floating point property.
    pub async fn get_f64(&self, device: &str, property: &str) -> AccessResult<f64> {
        self.get(device, property).await
    }

    /// Read an integer property.
    pub async fn get_i64(&self, device: &str, property: &str) -> AccessResult<i64> {
        self.get(device, property).await
    }

    /// Read a `1`/`0` property.
    pub async fn get_bool(&self, device: &str, property: &str) -> AccessResult<bool> {
        self.get(device, property).await
    }

    /// Names of every property on `device`.
    pub async fn property_names(&self, device: &str) -> AccessResult<Vec<String>> {
        retry_transient(&self.retry, "device_property_names", || async move {
            self.core
                .device_property_names(device)
                .await
                .map_err(|e| AccessError::from_core(e, device, "device_property_names"))
        })
        .await
    }

    /// Whether `device` exposes `property`.
    pub async fn has_property(&self, device: &str, property: &str) -> AccessResult<bool> {
        self.core
            .has_property(device, property)
            .await
            .map_err(|e| AccessError::from_core(e, device, "has_property"))
    }

    /// Collect type, access and constraint metadata for one property.
    pub async fn describe(&self, device: &str, property: &str) -> AccessResult<PropertyInfo> {
        let read_err = |e: CoreError| AccessError::from_core_read(e, device, property);

        let kind = self
            .core
            .property_type(device, property)
            .await
            .map_err(read_err)?;
        let read_only = self
            .core
            .is_property_read_only(device, property)
            .await
            .map_err(read_err)?;
        let allowed_values = self
            .core
            .allowed_property_values(device, property)
            .await
            .map_err(read_err)?;
        let limits = self
            .core
            .property_limits(device, property)
            .await
            .map_err(read_err)?;

        Ok(PropertyInfo {
            name: property.to_string(),
            kind,
            read_only,
            allowed_values,
            limits,
        })
    }
}

impl std::fmt::Debug for PropertyAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("core", &"<dyn ControlCore>")
            .field("retry", &self.retry)
            .finish()
    }
}
