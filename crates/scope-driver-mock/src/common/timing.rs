//! Timing configuration for realistic mode.

use std::time::Duration;

/// Hardware-like delays applied when the core runs in
/// [`MockMode::Realistic`](super::MockMode::Realistic).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Travel speed in µm/s.
    pub speed_um_per_sec: f64,
    /// Settling time after a move, in milliseconds.
    pub settling_time_ms: u64,
    /// Latency added to every core call, in milliseconds.
    pub communication_delay_ms: u64,
}

impl TimingConfig {
    /// Typical piezo or stepper focus drive.
    pub fn stage() -> Self {
        Self {
            speed_um_per_sec: 1_000.0,
            settling_time_ms: 50,
            communication_delay_ms: 2,
        }
    }

    /// How long a move over `distance` µm keeps the device busy.
    pub fn motion_time(&self, distance: f64) -> Duration {
        let travel = if self.speed_um_per_sec > 0.0 {
            Duration::from_secs_f64(distance.abs() / self.speed_um_per_sec)
        } else {
            Duration::ZERO
        };
        travel + Duration::from_millis(self.settling_time_ms)
    }

    /// Per-call latency.
    pub fn communication_delay(&self) -> Duration {
        Duration::from_millis(self.communication_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::stage()
    }
}
