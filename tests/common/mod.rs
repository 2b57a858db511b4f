//! Shared fixtures for integration tests.

#![allow(dead_code)]

use scope_core::{ControlCore, DeviceRole};
use scope_driver_mock::{ErrorConfig, MockCore, MockDevice, MockProperty};
use std::sync::Arc;

pub const STAGE: &str = "ZStage";
pub const BACKLASH: &str = "Backlash-B(um)";

/// Focus stage with a backlash property of "1.5", assigned to the focus role.
pub fn focus_stage() -> MockDevice {
    MockDevice::stage(STAGE)
        .with_role(DeviceRole::Focus)
        .with_travel(-1000.0, 1000.0)
        .with_property(MockProperty::float(BACKLASH, 1.5).with_limits(0.0, 10.0))
        .with_property(MockProperty::text("Description", "focus drive").read_only())
        .with_property(MockProperty::text("Mode", "fast").with_allowed(["fast", "fine"]))
        .with_property(MockProperty::text("Label", "objective turret"))
}

pub fn focus_core() -> Arc<MockCore> {
    focus_core_with(ErrorConfig::none())
}

pub fn focus_core_with(errors: ErrorConfig) -> Arc<MockCore> {
    Arc::new(MockCore::builder().device(focus_stage()).errors(errors).build())
}

/// The same core, typed for the accessor layer.
pub fn as_core(core: &Arc<MockCore>) -> Arc<dyn ControlCore> {
    core.clone()
}
