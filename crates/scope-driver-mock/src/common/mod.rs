//! Behavior knobs shared by the mock core: how fast it moves, how it fails, and
//! where its randomness comes from.

pub mod errors;
pub mod mode;
pub mod rng;
pub mod timing;

pub use errors::{ErrorConfig, ErrorScenario};
pub use mode::MockMode;
pub use rng::MockRng;
pub use timing::TimingConfig;
