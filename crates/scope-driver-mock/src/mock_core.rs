//! In-memory control core.

use async_trait::async_trait;
use parking_lot::Mutex;
use scope_core::control::{ControlCore, CoreResult, DeviceRole, PropertyType};
use scope_core::error::{CoreError, CoreErrorKind};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::common::{ErrorConfig, MockMode, TimingConfig};
use crate::config::MockCoreConfig;
use crate::device::{DeviceKind, MockDevice, MockProperty};

/// Busy polling cadence of the core's own `wait_for_device`.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Characters the core refuses inside a property value.
const FIELD_DELIMITERS: &[char] = &[','];

// =============================================================================
// State
// =============================================================================

#[derive(Debug)]
struct DeviceState {
    device: MockDevice,
    busy_until: Option<Instant>,
    forced_busy: bool,
}

impl DeviceState {
    fn is_busy(&self) -> bool {
        self.forced_busy || self.busy_until.is_some_and(|until| Instant::now() < until)
    }
}

#[derive(Debug, Default)]
struct CoreState {
    devices: Vec<DeviceState>,
    roles: HashMap<DeviceRole, String>,
}

fn unknown_device(label: &str) -> CoreError {
    CoreError::for_device(
        label,
        CoreErrorKind::UnknownDevice,
        format!("No device with label \"{}\"", label),
    )
}

fn unknown_property(label: &str, name: &str) -> CoreError {
    CoreError::for_device(
        label,
        CoreErrorKind::UnknownProperty,
        format!("Property \"{}\" not found on \"{}\"", name, label),
    )
}

fn wrong_kind(label: &str, kind: DeviceKind, wanted: DeviceKind) -> CoreError {
    CoreError::for_device(
        label,
        CoreErrorKind::Generic,
        format!("\"{}\" is a {}, not a {}", label, kind, wanted),
    )
}

// =============================================================================
// MockCore
// =============================================================================

/// A [`ControlCore`] backed by in-memory devices.
///
/// # Example
///
/// ```rust,ignore
/// use scope_driver_mock::{MockCore, MockDevice, MockProperty};
/// use scope_core::DeviceRole;
///
/// let core = MockCore::builder()
///     .device(MockDevice::stage("ZStage").with_property(MockProperty::float("Backlash-B(um)", 1.5)))
///     .role(DeviceRole::Focus, "ZStage")
///     .build();
/// ```
#[derive(Debug)]
pub struct MockCore {
    state: Mutex<CoreState>,
    calls: Mutex<HashMap<&'static str, u32>>,
    mode: MockMode,
    timing: TimingConfig,
    errors: ErrorConfig,
    wait_timeout: Duration,
}

impl MockCore {
    /// A core with no devices and no roles.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building a core.
    pub fn builder() -> MockCoreBuilder {
        MockCoreBuilder::default()
    }

    /// Build from serde configuration.
    pub fn from_config(config: &MockCoreConfig) -> Result<Self, String> {
        config.validate()?;

        let mut builder = Self::builder()
            .mode(config.mode)
            .wait_timeout(config.wait_timeout());
        if config.mode == MockMode::Chaos {
            let errors = ErrorConfig::random_failures_seeded(config.failure_rate, config.seed);
            tracing::info!(
                failure_rate = config.failure_rate,
                seed = errors.seed(),
                "chaos mode enabled"
            );
            builder = builder.errors(errors);
        }
        for device in &config.devices {
            builder = builder.device(device.clone());
        }
        Ok(builder.build())
    }

    /// Operational mode.
    pub fn mode(&self) -> MockMode {
        self.mode
    }

    /// Injected error configuration.
    pub fn errors(&self) -> &ErrorConfig {
        &self.errors
    }

    // -------------------------------------------------------------------------
    // Test controls
    // -------------------------------------------------------------------------

    /// Bind `role` to `label`, as a configuration change would.
    pub fn assign_role(&self, role: DeviceRole, label: impl Into<String>) {
        let label = label.into();
        tracing::debug!(%role, device = %label, "mock role assigned");
        self.state.lock().roles.insert(role, label);
    }

    /// Unbind `role`.
    pub fn clear_role(&self, role: DeviceRole) {
        self.state.lock().roles.remove(&role);
    }

    /// Load another device at runtime.
    pub fn add_device(&self, device: MockDevice) {
        let mut state = self.state.lock();
        state.devices.retain(|d| d.device.label != device.label);
        state.devices.push(DeviceState {
            device,
            busy_until: None,
            forced_busy: false,
        });
    }

    /// Hold `label` busy (or release it) regardless of motion.
    ///
    /// Returns `false` if no such device is loaded.
    pub fn set_busy(&self, label: &str, busy: bool) -> bool {
        let mut state = self.state.lock();
        match state.devices.iter_mut().find(|d| d.device.label == label) {
            Some(dev) => {
                dev.forced_busy = busy;
                true
            }
            None => false,
        }
    }

    /// Current single axis position of `label`, bypassing call accounting.
    pub fn position_of(&self, label: &str) -> Option<f64> {
        let state = self.state.lock();
        state
            .devices
            .iter()
            .find(|d| d.device.label == label)
            .map(|d| d.device.position)
    }

    /// Current value of a property, bypassing call accounting.
    pub fn property_value(&self, label: &str, name: &str) -> Option<String> {
        let state = self.state.lock();
        state
            .devices
            .iter()
            .find(|d| d.device.label == label)
            .and_then(|d| d.device.property(name))
            .map(|p| p.value.clone())
    }

    /// How many times `operation` was called.
    pub fn call_count(&self, operation: &str) -> u32 {
        self.calls.lock().get(operation).copied().unwrap_or(0)
    }

    /// Total calls across all operations.
    pub fn total_calls(&self) -> u32 {
        self.calls.lock().values().sum()
    }

    /// Zero every call counter.
    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Count the call, apply latency, then consult error injection.
    async fn enter(&self, operation: &'static str, device: Option<&str>) -> CoreResult<()> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;
        tracing::trace!(operation, device, "mock core call");
        if self.mode.is_timed() {
            sleep(self.timing.communication_delay()).await;
        }
        self.errors.check_operation(device, operation)
    }

    fn with_device<T>(
        &self,
        label: &str,
        f: impl FnOnce(&mut DeviceState) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut state = self.state.lock();
        let dev = state
            .devices
            .iter_mut()
            .find(|d| d.device.label == label)
            .ok_or_else(|| unknown_device(label))?;
        f(dev)
    }

    fn with_property<T>(
        &self,
        label: &str,
        name: &str,
        f: impl FnOnce(&MockProperty) -> T,
    ) -> CoreResult<T> {
        self.with_device(label, |dev| {
            dev.device
                .property(name)
                .map(f)
                .ok_or_else(|| unknown_property(label, name))
        })
    }

    fn start_motion(&self, dev: &mut DeviceState, distance: f64) {
        if self.mode.is_timed() {
            dev.busy_until = Some(Instant::now() + self.timing.motion_time(distance));
        }
    }

    fn move_axis(&self, label: &str, target: impl FnOnce(f64) -> f64) -> CoreResult<()> {
        self.with_device(label, |dev| {
            if dev.device.kind != DeviceKind::Stage {
                return Err(wrong_kind(label, dev.device.kind, DeviceKind::Stage));
            }
            let from = dev.device.position;
            let to = target(from);
            if let Some(reason) = dev.device.out_of_travel(to) {
                return Err(CoreError::for_device(
                    label,
                    CoreErrorKind::InvalidPropertyValue,
                    reason,
                ));
            }
            dev.device.position = to;
            self.start_motion(dev, to - from);
            Ok(())
        })
    }

    fn move_xy(&self, label: &str, target: impl FnOnce((f64, f64)) -> (f64, f64)) -> CoreResult<()> {
        self.with_device(label, |dev| {
            if dev.device.kind != DeviceKind::XyStage {
                return Err(wrong_kind(label, dev.device.kind, DeviceKind::XyStage));
            }
            let from = dev.device.xy;
            let to = target(from);
            if let Some(reason) = dev
                .device
                .out_of_travel(to.0)
                .or_else(|| dev.device.out_of_travel(to.1))
            {
                return Err(CoreError::for_device(
                    label,
                    CoreErrorKind::InvalidPropertyValue,
                    reason,
                ));
            }
            dev.device.xy = to;
            self.start_motion(dev, (to.0 - from.0).abs().max((to.1 - from.1).abs()));
            Ok(())
        })
    }

    fn require_motion(label: &str, dev: &DeviceState) -> CoreResult<()> {
        match dev.device.kind {
            DeviceKind::Stage | DeviceKind::XyStage => Ok(()),
            DeviceKind::Generic => Err(wrong_kind(label, DeviceKind::Generic, DeviceKind::Stage)),
        }
    }
}

impl Default for MockCore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlCore for MockCore {
    async fn role_device(&self, role: DeviceRole) -> CoreResult<String> {
        self.enter("role_device", None).await?;
        Ok(self.state.lock().roles.get(&role).cloned().unwrap_or_default())
    }

    async fn loaded_devices(&self) -> CoreResult<Vec<String>> {
        self.enter("loaded_devices", None).await?;
        Ok(self
            .state
            .lock()
            .devices
            .iter()
            .map(|d| d.device.label.clone())
            .collect())
    }

    async fn set_position(&self, device: &str, position: f64) -> CoreResult<()> {
        self.enter("set_position", Some(device)).await?;
        self.move_axis(device, |_| position)
    }

    async fn set_relative_position(&self, device: &str, delta: f64) -> CoreResult<()> {
        self.enter("set_relative_position", Some(device)).await?;
        self.move_axis(device, |from| from + delta)
    }

    async fn get_position(&self, device: &str) -> CoreResult<f64> {
        self.enter("get_position", Some(device)).await?;
        self.with_device(device, |dev| {
            if dev.device.kind != DeviceKind::Stage {
                return Err(wrong_kind(device, dev.device.kind, DeviceKind::Stage));
            }
            Ok(dev.device.position)
        })
    }

    async fn set_xy_position(&self, device: &str, x: f64, y: f64) -> CoreResult<()> {
        self.enter("set_xy_position", Some(device)).await?;
        self.move_xy(device, |_| (x, y))
    }

    async fn set_relative_xy_position(&self, device: &str, dx: f64, dy: f64) -> CoreResult<()> {
        self.enter("set_relative_xy_position", Some(device)).await?;
        self.move_xy(device, |(x, y)| (x + dx, y + dy))
    }

    async fn get_xy_position(&self, device: &str) -> CoreResult<(f64, f64)> {
        self.enter("get_xy_position", Some(device)).await?;
        self.with_device(device, |dev| {
            if dev.device.kind != DeviceKind::XyStage {
                return Err(wrong_kind(device, dev.device.kind, DeviceKind::XyStage));
            }
            Ok(dev.device.xy)
        })
    }

    async fn stop(&self, device: &str) -> CoreResult<()> {
        self.enter("stop", Some(device)).await?;
        self.with_device(device, |dev| {
            Self::require_motion(device, dev)?;
            dev.busy_until = None;
            Ok(())
        })
    }

    async fn home(&self, device: &str) -> CoreResult<()> {
        self.enter("home", Some(device)).await?;
        self.with_device(device, |dev| {
            Self::require_motion(device, dev)?;
            let distance = match dev.device.kind {
                DeviceKind::XyStage => dev.device.xy.0.abs().max(dev.device.xy.1.abs()),
                _ => dev.device.position.abs(),
            };
            dev.device.position = 0.0;
            dev.device.xy = (0.0, 0.0);
            self.start_motion(dev, distance);
            Ok(())
        })
    }

    async fn device_busy(&self, device: &str) -> CoreResult<bool> {
        self.enter("device_busy", Some(device)).await?;
        self.with_device(device, |dev| Ok(dev.is_busy()))
    }

    async fn wait_for_device(&self, device: &str) -> CoreResult<()> {
        self.enter("wait_for_device", Some(device)).await?;
        let deadline = Instant::now() + self.wait_timeout;
        loop {
            if !self.with_device(device, |dev| Ok(dev.is_busy()))? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CoreError::for_device(
                    device,
                    CoreErrorKind::PollingTimeout,
                    format!(
                        "Wait for device \"{}\" timed out after {} ms",
                        device,
                        self.wait_timeout.as_millis()
                    ),
                ));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn get_property(&self, device: &str, property: &str) -> CoreResult<String> {
        self.enter("get_property", Some(device)).await?;
        self.with_property(device, property, |p| p.value.clone())
    }

    async fn set_property(&self, device: &str, property: &str, value: &str) -> CoreResult<()> {
        self.enter("set_property", Some(device)).await?;
        self.with_device(device, |dev| {
            if value.contains(FIELD_DELIMITERS) {
                return Err(CoreError::for_device(
                    device,
                    CoreErrorKind::InvalidContents,
                    format!("Property value \"{}\" contains invalid characters", value),
                ));
            }
            let prop = dev
                .device
                .property_mut(property)
                .ok_or_else(|| unknown_property(device, property))?;
            if prop.read_only {
                return Err(CoreError::for_device(
                    device,
                    CoreErrorKind::ReadOnlyProperty,
                    format!("Property \"{}\" is read-only", property),
                ));
            }
            if let Some(reason) = prop.rejection(value) {
                return Err(CoreError::for_device(
                    device,
                    CoreErrorKind::InvalidPropertyValue,
                    reason,
                ));
            }
            prop.value = value.to_string();
            Ok(())
        })
    }

    async fn device_property_names(&self, device: &str) -> CoreResult<Vec<String>> {
        self.enter("device_property_names", Some(device)).await?;
        self.with_device(device, |dev| {
            Ok(dev.device.properties.iter().map(|p| p.name.clone()).collect())
        })
    }

    async fn has_property(&self, device: &str, property: &str) -> CoreResult<bool> {
        self.enter("has_property", Some(device)).await?;
        self.with_device(device, |dev| Ok(dev.device.property(property).is_some()))
    }

    async fn is_property_read_only(&self, device: &str, property: &str) -> CoreResult<bool> {
        self.enter("is_property_read_only", Some(device)).await?;
        self.with_property(device, property, |p| p.read_only)
    }

    async fn allowed_property_values(
        &self,
        device: &str,
        property: &str,
    ) -> CoreResult<Vec<String>> {
        self.enter("allowed_property_values", Some(device)).await?;
        self.with_property(device, property, |p| p.allowed.clone())
    }

    async fn property_limits(&self, device: &str, property: &str) -> CoreResult<Option<(f64, f64)>> {
        self.enter("property_limits", Some(device)).await?;
        self.with_property(device, property, |p| p.limits)
    }

    async fn property_type(&self, device: &str, property: &str) -> CoreResult<PropertyType> {
        self.enter("property_type", Some(device)).await?;
        self.with_property(device, property, |p| p.kind)
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`MockCore`].
#[derive(Debug, Default)]
pub struct MockCoreBuilder {
    devices: Vec<MockDevice>,
    roles: Vec<(DeviceRole, String)>,
    mode: MockMode,
    timing: Option<TimingConfig>,
    errors: Option<ErrorConfig>,
    wait_timeout: Option<Duration>,
}

impl MockCoreBuilder {
    /// Load a device. A later device with the same label replaces it.
    pub fn device(mut self, device: MockDevice) -> Self {
        self.devices.retain(|d| d.label != device.label);
        self.devices.push(device);
        self
    }

    /// Assign `role` to `label`, overriding any device's own role list.
    /// The label need not be loaded.
    pub fn role(mut self, role: DeviceRole, label: impl Into<String>) -> Self {
        self.roles.push((role, label.into()));
        self
    }

    /// Set the operational mode.
    pub fn mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set realistic-mode timing.
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Inject errors.
    pub fn errors(mut self, errors: ErrorConfig) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Bound the core's own `wait_for_device`.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Build the core.
    pub fn build(self) -> MockCore {
        let mut roles: HashMap<DeviceRole, String> = HashMap::new();
        for device in &self.devices {
            for role in &device.roles {
                roles.insert(*role, device.label.clone());
            }
        }
        roles.extend(self.roles);

        let devices = self
            .devices
            .into_iter()
            .map(|device| DeviceState {
                device,
                busy_until: None,
                forced_busy: false,
            })
            .collect();
        MockCore {
            state: Mutex::new(CoreState {
                devices,
                roles,
            }),
            calls: Mutex::new(HashMap::new()),
            mode: self.mode,
            timing: self.timing.unwrap_or_default(),
            errors: self.errors.unwrap_or_default(),
            wait_timeout: self.wait_timeout.unwrap_or(Duration::from_millis(5000)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorScenario;

    fn core() -> MockCore {
        MockCore::builder()
            .device(
                MockDevice::stage("ZStage")
                    .with_travel(-100.0, 100.0)
                    .with_property(MockProperty::float("Backlash-B(um)", 1.5).with_limits(0.0, 10.0))
                    .with_property(MockProperty::text("Description", "focus").read_only()),
            )
            .device(MockDevice::xy_stage("XYStage"))
            .role(DeviceRole::Focus, "ZStage")
            .build()
    }

    #[tokio::test]
    async fn test_role_lookup() {
        let core = core();
        assert_eq!(core.role_device(DeviceRole::Focus).await.unwrap(), "ZStage");
        assert_eq!(core.role_device(DeviceRole::Camera).await.unwrap(), "");

        core.assign_role(DeviceRole::Focus, "XYStage");
        assert_eq!(core.role_device(DeviceRole::Focus).await.unwrap(), "XYStage");

        core.clear_role(DeviceRole::Focus);
        assert_eq!(core.role_device(DeviceRole::Focus).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_absolute_and_relative_moves() {
        let core = core();
        core.set_position("ZStage", 10.0).await.unwrap();
        core.set_relative_position("ZStage", -2.5).await.unwrap();
        assert_eq!(core.get_position("ZStage").await.unwrap(), 7.5);
    }

    #[tokio::test]
    async fn test_move_outside_travel_rejected() {
        let core = core();
        let err = core.set_position("ZStage", 500.0).await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::InvalidPropertyValue);
        assert_eq!(core.position_of("ZStage"), Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let core = core();
        let err = core.get_position("Nope").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::UnknownDevice);
    }

    #[tokio::test]
    async fn test_wrong_device_kind() {
        let core = core();
        let err = core.get_xy_position("ZStage").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::Generic);
    }

    #[tokio::test]
    async fn test_set_property_checks() {
        let core = core();

        core.set_property("ZStage", "Backlash-B(um)", "2.25").await.unwrap();
        assert_eq!(core.get_property("ZStage", "Backlash-B(um)").await.unwrap(), "2.25");

        let err = core.set_property("ZStage", "Backlash-B(um)", "11").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::InvalidPropertyValue);

        let err = core.set_property("ZStage", "Description", "x").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::ReadOnlyProperty);

        let err = core.set_property("ZStage", "Backlash-B(um)", "1,5").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::InvalidContents);

        let err = core.get_property("ZStage", "Speed").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::UnknownProperty);

        assert_eq!(core.property_value("ZStage", "Backlash-B(um)").as_deref(), Some("2.25"));
    }

    #[tokio::test]
    async fn test_property_metadata() {
        let core = core();
        assert_eq!(
            core.device_property_names("ZStage").await.unwrap(),
            vec!["Backlash-B(um)".to_string(), "Description".to_string()]
        );
        assert!(core.has_property("ZStage", "Description").await.unwrap());
        assert!(!core.has_property("ZStage", "Speed").await.unwrap());
        assert!(core.is_property_read_only("ZStage", "Description").await.unwrap());
        assert_eq!(
            core.property_limits("ZStage", "Backlash-B(um)").await.unwrap(),
            Some((0.0, 10.0))
        );
        assert_eq!(
            core.property_type("ZStage", "Backlash-B(um)").await.unwrap(),
            PropertyType::Float
        );
    }

    #[tokio::test]
    async fn test_call_counts() {
        let core = core();
        core.role_device(DeviceRole::Focus).await.unwrap();
        core.role_device(DeviceRole::Focus).await.unwrap();
        let _ = core.get_position("Nope").await;

        assert_eq!(core.call_count("role_device"), 2);
        assert_eq!(core.call_count("get_position"), 1);
        assert_eq!(core.total_calls(), 3);

        core.reset_calls();
        assert_eq!(core.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_error_injection_applies_to_named_operation() {
        let core = MockCore::builder()
            .device(MockDevice::stage("ZStage"))
            .errors(ErrorConfig::scenario(ErrorScenario::Timeout {
                operation: "wait_for_device",
            }))
            .build();

        assert!(core.get_position("ZStage").await.is_ok());
        let err = core.wait_for_device("ZStage").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::PollingTimeout);
        assert_eq!(err.device.as_deref(), Some("ZStage"));
    }

    #[tokio::test]
    async fn test_forced_busy_times_out_core_wait() {
        let core = MockCore::builder()
            .device(MockDevice::stage("ZStage"))
            .wait_timeout(Duration::from_millis(30))
            .build();

        assert!(core.set_busy("ZStage", true));
        assert!(core.device_busy("ZStage").await.unwrap());
        let err = core.wait_for_device("ZStage").await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::PollingTimeout);

        core.set_busy("ZStage", false);
        core.wait_for_device("ZStage").await.unwrap();
        assert!(!core.set_busy("Nope", true));
    }

    #[tokio::test(start_paused = true)]
    async fn test_realistic_motion_keeps_device_busy() {
        let core = MockCore::builder()
            .device(MockDevice::stage("ZStage"))
            .mode(MockMode::Realistic)
            .timing(TimingConfig {
                speed_um_per_sec: 1000.0,
                settling_time_ms: 0,
                communication_delay_ms: 0,
            })
            .build();

        core.set_position("ZStage", 200.0).await.unwrap();
        assert!(core.device_busy("ZStage").await.unwrap());

        core.wait_for_device("ZStage").await.unwrap();
        assert!(!core.device_busy("ZStage").await.unwrap());
        assert_eq!(core.get_position("ZStage").await.unwrap(), 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_motion() {
        let core = MockCore::builder()
            .device(MockDevice::stage("ZStage"))
            .mode(MockMode::Realistic)
            .build();

        core.set_position("ZStage", 4000.0).await.unwrap();
        assert!(core.device_busy("ZStage").await.unwrap());
        core.stop("ZStage").await.unwrap();
        assert!(!core.device_busy("ZStage").await.unwrap());
    }

    #[tokio::test]
    async fn test_xy_moves_and_home() {
        let core = core();
        core.set_xy_position("XYStage", 10.0, 20.0).await.unwrap();
        core.set_relative_xy_position("XYStage", 1.0, -1.0).await.unwrap();
        assert_eq!(core.get_xy_position("XYStage").await.unwrap(), (11.0, 19.0));

        core.home("XYStage").await.unwrap();
        assert_eq!(core.get_xy_position("XYStage").await.unwrap(), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_from_config_chaos_mode_injects_failures() {
        let config = MockCoreConfig {
            mode: MockMode::Chaos,
            seed: Some(1),
            failure_rate: 1.0,
            ..MockCoreConfig::demo()
        };
        let core = MockCore::from_config(&config).unwrap();
        let err = core.role_device(DeviceRole::Focus).await.unwrap_err();
        assert_eq!(err.kind, CoreErrorKind::Communication);
    }

    #[tokio::test]
    async fn test_from_config_demo() {
        let core = MockCore::from_config(&MockCoreConfig::demo()).unwrap();
        assert_eq!(
            core.loaded_devices().await.unwrap(),
            vec!["ZStage", "XYStage", "Camera", "Shutter"]
        );
        assert_eq!(core.role_device(DeviceRole::XYStage).await.unwrap(), "XYStage");
    }
}
