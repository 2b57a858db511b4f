//! Failure injection for the mock core.
//!
//! Operations are named after the [`ControlCore`](scope_core::ControlCore)
//! method they guard (`"get_property"`, `"wait_for_device"`, ...). Injected
//! failures are [`CoreError`]s, so they travel the same mapping path as real
//! core failures.
//!
//! Checks run in a fixed order on every call:
//!
//! 1. a link already lost or faulted fails everything
//! 2. scripted [`ErrorScenario`]s, in the order given
//! 3. the random failure rate for the operation

use super::rng::MockRng;
use parking_lot::Mutex;
use scope_core::error::{CoreError, CoreErrorKind};
use std::collections::HashMap;
use std::sync::Arc;

/// A scripted failure.
#[derive(Debug, Clone)]
pub enum ErrorScenario {
    /// Fail every call of `operation` after `count` successful ones
    FailAfterN {
        /// Guarded operation.
        operation: &'static str,
        /// Calls that succeed first.
        count: u32,
    },
    /// Every call of `operation` reports a polling timeout
    Timeout {
        /// Guarded operation.
        operation: &'static str,
    },
    /// The link drops on the first call and stays down
    CommunicationLoss,
    /// The device faults on the first call and stays faulted
    HardwareFault {
        /// Fault code reported in the message.
        code: u32,
    },
}

/// Link condition after scenarios have fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Link {
    #[default]
    Up,
    Lost,
    Faulted(u32),
}

#[derive(Debug, Default)]
struct InjectionState {
    link: Link,
    /// Calls seen per guarded operation, for `FailAfterN`.
    calls: HashMap<&'static str, u32>,
}

/// Random failure probabilities.
#[derive(Debug, Clone, Default)]
struct Rates {
    all: f64,
    per_operation: HashMap<&'static str, f64>,
}

impl Rates {
    fn for_operation(&self, operation: &str) -> f64 {
        self.per_operation.get(operation).copied().unwrap_or(self.all)
    }
}

/// Failure injection shared by every clone of a mock core.
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    rates: Arc<Rates>,
    scenarios: Arc<[ErrorScenario]>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<InjectionState>>,
}

impl ErrorConfig {
    /// No injected failures.
    pub fn none() -> Self {
        Self::build(Rates::default(), Vec::new(), None)
    }

    /// Every operation fails with probability `rate`.
    pub fn random_failures(rate: f64) -> Self {
        Self::random_failures_seeded(rate, None)
    }

    /// Like [`random_failures`](Self::random_failures) with a replayable seed.
    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        let rates = Rates {
            all: rate,
            ..Rates::default()
        };
        Self::build(rates, Vec::new(), seed)
    }

    /// A single scripted failure.
    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    /// Several scripted failures, checked in order.
    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self::build(Rates::default(), scenarios, None)
    }

    /// Per-operation failure probabilities; unlisted operations never fail.
    pub fn with_rates(rates: HashMap<&'static str, f64>) -> Self {
        let rates = Rates {
            all: 0.0,
            per_operation: rates,
        };
        Self::build(rates, Vec::new(), None)
    }

    fn build(rates: Rates, scenarios: Vec<ErrorScenario>, seed: Option<u64>) -> Self {
        Self {
            rates: Arc::new(rates),
            scenarios: scenarios.into(),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(InjectionState::default())),
        }
    }

    /// Seed of the random failure generator.
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    /// Decide whether this call of `operation` on `device` fails.
    pub fn check_operation(
        &self,
        device: Option<&str>,
        operation: &'static str,
    ) -> Result<(), CoreError> {
        let fail = |kind: CoreErrorKind, message: String| match device {
            Some(label) => CoreError::for_device(label, kind, message),
            None => CoreError::new(kind, message),
        };

        let mut state = self.state.lock();
        if let Some(err) = link_failure(state.link) {
            return Err(fail(err.0, err.1));
        }

        for scenario in self.scenarios.iter() {
            match *scenario {
                ErrorScenario::FailAfterN { operation: op, count } if op == operation => {
                    let seen = state.calls.entry(operation).or_insert(0);
                    *seen += 1;
                    if *seen > count {
                        return Err(fail(
                            CoreErrorKind::Hardware,
                            format!("Injected failure of {} after {} calls", operation, count),
                        ));
                    }
                }
                ErrorScenario::Timeout { operation: op } if op == operation => {
                    return Err(fail(
                        CoreErrorKind::PollingTimeout,
                        format!("{} timed out", operation),
                    ));
                }
                ErrorScenario::CommunicationLoss => state.link = Link::Lost,
                ErrorScenario::HardwareFault { code } => state.link = Link::Faulted(code),
                _ => {}
            }
            if let Some(err) = link_failure(state.link) {
                tracing::debug!(operation, link = ?state.link, "mock link went down");
                return Err(fail(err.0, err.1));
            }
        }
        drop(state);

        if self.rng.should_fail(self.rates.for_operation(operation)) {
            return Err(fail(
                CoreErrorKind::Communication,
                format!("Random failure on {}", operation),
            ));
        }
        Ok(())
    }

    /// Bring the link back up and zero the `FailAfterN` counters.
    pub fn reset(&self) {
        *self.state.lock() = InjectionState::default();
    }
}

fn link_failure(link: Link) -> Option<(CoreErrorKind, String)> {
    match link {
        Link::Up => None,
        Link::Lost => Some((CoreErrorKind::Communication, "Communication lost".to_string())),
        Link::Faulted(code) => Some((CoreErrorKind::Hardware, format!("Hardware fault: {}", code))),
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}
