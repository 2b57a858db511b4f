//! `scope-core`
//!
//! Fault-tolerant accessor layer over a microscope hardware control core.
//!
//! UI and orchestration code never talk to the control core directly. They go
//! through this crate, which turns the core's failing calls into typed
//! [`AccessError`]s and never panics or substitutes defaults.
//!
//! ## Layers
//!
//! - **[`ControlCore`]**: the external runtime that owns device communication
//!   (a trait; implemented by a hardware binding or by `scope-driver-mock`)
//! - **[`PropertyAccessor`]**: string-encoded property get/set with typed coercion
//!   through [`PropertyValue`]
//! - **[`DeviceResolver`]**: stateless role to device name lookup
//! - **Facades** ([`ZStage`], [`XyStage`]): resolve once, then expose typed
//!   domain operations over the cached device name
//!
//! ## Example
//!
//! ```rust,ignore
//! use scope_core::{ZStage, AccessError};
//! use std::time::Duration;
//!
//! let stage = ZStage::new(core.clone());
//! match stage.find_device().await {
//!     Ok(name) => println!("focus stage: {name}"),
//!     Err(AccessError::NoDeviceConfigured { .. }) => println!("no focus stage"),
//!     Err(e) => return Err(e.into()),
//! }
//!
//! stage.set_relative_position(-2.5).await?;
//! stage.wait_for_device(Duration::from_secs(5)).await?;
//! ```
//!
//! ## Threading
//!
//! Cores must be `Send + Sync`. The layer adds no locking around core calls; wrap
//! a core that cannot take concurrent calls in [`SerializedCore`].

pub mod accessor;
pub mod cancel;
pub mod codec;
pub mod config;
pub mod control;
pub mod error;
pub mod error_recovery;
pub mod facade;
pub mod resolver;
pub mod serialized;

pub use accessor::{PropertyAccessor, PropertyInfo};
pub use cancel::CancelToken;
pub use codec::{PropertyValue, ValueKind};
pub use config::AccessorConfig;
pub use control::{ControlCore, CoreResult, DeviceName, DeviceRole, PropertyType};
pub use error::{AccessError, AccessResult, CoreError, CoreErrorKind, ParseFailure};
pub use error_recovery::RetryPolicy;
pub use facade::{DeviceHandle, XyPosition, XyStage, ZStage};
pub use resolver::DeviceResolver;
pub use serialized::SerializedCore;
