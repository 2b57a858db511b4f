//! # rust-scope
//!
//! Application crate for the microscope device accessor layer. The layer itself
//! lives in `scope-core`; the simulated control core in `scope-driver-mock`.
//! This crate adds what a runnable program needs on top of them.
//!
//! ## Crate Structure
//!
//! - **`config`**: `AppConfig`, loaded with Figment from `config/rust_scope.toml`
//!   and `RUST_SCOPE_` environment variables.
//! - **`logging`**: `tracing-subscriber` setup with pretty, compact and JSON output.
//! - **`microscope`**: wires one shared control core to the typed facades.

pub mod config;
pub mod logging;
pub mod microscope;

pub use microscope::Microscope;

// Re-export the layer crates so downstream users need only one dependency.
pub use scope_core;
pub use scope_driver_mock;
