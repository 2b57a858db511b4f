//! Mock control core for rust-scope
//!
//! This crate provides an in-memory [`ControlCore`](scope_core::ControlCore) for
//! testing without a microscope attached. All delays use `tokio::time::sleep`, so
//! tests can run with paused time.
//!
//! # What it simulates
//!
//! - Role assignments that can be changed at runtime, as a configuration reload would
//! - Single axis and XY stages with optional travel limits
//! - Properties with allowed values, numeric limits, declared types and read-only flags
//! - Busy state: forced by the test, or derived from motion timing in
//!   [`MockMode::Realistic`]
//! - The core's own 10 ms busy polling with a timeout in `wait_for_device`
//! - Injected failures through [`ErrorConfig`]
//!
//! # Example
//!
//! ```rust,ignore
//! use scope_core::{DeviceRole, ZStage};
//! use scope_driver_mock::{MockCore, MockDevice, MockProperty};
//! use std::sync::Arc;
//!
//! let core = Arc::new(
//!     MockCore::builder()
//!         .device(MockDevice::stage("ZStage").with_property(MockProperty::float("Backlash-B(um)", 1.5)))
//!         .role(DeviceRole::Focus, "ZStage")
//!         .build(),
//! );
//! let stage = ZStage::new(core.clone());
//! stage.find_device().await?;
//! assert_eq!(stage.get_backlash().await?, 1.5);
//! ```

pub mod common;
mod config;
mod device;
mod mock_core;

pub use common::{ErrorConfig, ErrorScenario, MockMode, MockRng, TimingConfig};
pub use config::MockCoreConfig;
pub use device::{DeviceKind, MockDevice, MockProperty};
pub use mock_core::{MockCore, MockCoreBuilder, POLL_INTERVAL};
