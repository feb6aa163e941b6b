//! Error injection framework for the simulated supply.
//!
//! Enables configurable failures for resilience testing of the coordinator:
//! random failure rates per operation, fail-after-N, timeouts, loss of the
//! link, latched hardware faults and channels that never answer.

use super::rng::MockRng;
use hv_core::{DriverError, DriverErrorKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Error injection configuration.
///
/// Cloning shares the scenario state, so a configuration handed to a supply
/// can still be reset from a test.
#[derive(Clone, Debug)]
pub struct ErrorConfig {
    /// Per-operation failure rate (0.0 to 1.0); `"*"` applies to all operations
    failure_rates: Arc<HashMap<&'static str, f64>>,
    scenarios: Arc<Vec<ErrorScenario>>,
    rng: Arc<MockRng>,
    state: Arc<Mutex<ErrorState>>,
}

#[derive(Debug, Clone)]
pub enum ErrorScenario {
    /// Fail after N successful operations
    FailAfterN {
        operation: &'static str,
        count: u32,
    },
    /// Timeout on specific operation
    Timeout { operation: &'static str },
    /// Simulate loss of the link; every later call fails
    CommunicationLoss,
    /// Latched hardware fault with specific code
    HardwareFault { code: u32 },
    /// Every operation addressed to this channel fails
    ChannelFault { channel: usize },
}

#[derive(Default, Debug)]
struct ErrorState {
    operation_counts: HashMap<&'static str, u32>,
    communication_lost: bool,
    /// 0 = no fault
    hardware_fault_code: u32,
}

impl ErrorConfig {
    /// No errors (default)
    pub fn none() -> Self {
        Self::build(HashMap::new(), Vec::new(), None)
    }

    /// Uniform random failures on every operation
    pub fn random_failures(rate: f64) -> Self {
        Self::random_failures_seeded(rate, None)
    }

    pub fn random_failures_seeded(rate: f64, seed: Option<u64>) -> Self {
        let mut rates = HashMap::new();
        rates.insert("*", rate);
        Self::build(rates, Vec::new(), seed)
    }

    pub fn scenario(scenario: ErrorScenario) -> Self {
        Self::scenarios(vec![scenario])
    }

    pub fn scenarios(scenarios: Vec<ErrorScenario>) -> Self {
        Self::build(HashMap::new(), scenarios, None)
    }

    /// Custom failure rates per operation
    pub fn with_rates(rates: HashMap<&'static str, f64>) -> Self {
        Self::build(rates, Vec::new(), None)
    }

    fn build(
        rates: HashMap<&'static str, f64>,
        scenarios: Vec<ErrorScenario>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            failure_rates: Arc::new(rates),
            scenarios: Arc::new(scenarios),
            rng: Arc::new(MockRng::new(seed)),
            state: Arc::new(Mutex::new(ErrorState::default())),
        }
    }

    /// Check if an operation should fail and return the error to report.
    ///
    /// `channel` is `None` for device-wide operations (identify, connect).
    pub fn check_operation(
        &self,
        driver_type: &str,
        operation: &'static str,
        channel: Option<usize>,
    ) -> Result<(), DriverError> {
        let mut state = self.state.lock();

        if state.communication_lost {
            return Err(DriverError::new(
                driver_type,
                DriverErrorKind::Communication,
                "Communication lost",
            ));
        }

        if state.hardware_fault_code != 0 {
            return Err(DriverError::new(
                driver_type,
                DriverErrorKind::Hardware,
                format!("Hardware fault: {}", state.hardware_fault_code),
            ));
        }

        for scenario in self.scenarios.iter() {
            match scenario {
                ErrorScenario::FailAfterN {
                    operation: op,
                    count,
                } if *op == operation => {
                    let current = state.operation_counts.entry(operation).or_insert(0);
                    *current += 1;
                    if *current > *count {
                        return Err(DriverError::new(
                            driver_type,
                            DriverErrorKind::Hardware,
                            format!("Injected failure after {} operations", count),
                        ));
                    }
                }
                ErrorScenario::Timeout { operation: op } if *op == operation => {
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Timeout,
                        format!("Operation '{}' timed out", operation),
                    ));
                }
                ErrorScenario::ChannelFault { channel: faulty } if channel == Some(*faulty) => {
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Communication,
                        format!("No response from CH{}", faulty),
                    ));
                }
                ErrorScenario::CommunicationLoss => {
                    state.communication_lost = true;
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Communication,
                        "Communication lost",
                    ));
                }
                ErrorScenario::HardwareFault { code } => {
                    state.hardware_fault_code = *code;
                    return Err(DriverError::new(
                        driver_type,
                        DriverErrorKind::Hardware,
                        format!("Hardware fault: {}", code),
                    ));
                }
                _ => {}
            }
        }

        let rate = self
            .failure_rates
            .get(operation)
            .or_else(|| self.failure_rates.get("*"))
            .copied()
            .unwrap_or(0.0);

        if self.rng.should_fail(rate) {
            return Err(DriverError::new(
                driver_type,
                DriverErrorKind::Communication,
                format!("Random failure on operation '{}'", operation),
            ));
        }

        Ok(())
    }

    /// Reset error state (clear counters, faults, link loss)
    pub fn reset(&self) {
        *self.state.lock() = ErrorState::default();
    }
}

impl Default for ErrorConfig {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_errors() {
        let config = ErrorConfig::none();
        for _ in 0..100 {
            assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
        }
    }

    #[test]
    fn test_random_failures() {
        let config = ErrorConfig::random_failures_seeded(0.5, Some(42));
        let failures = (0..1000)
            .filter(|_| config.check_operation("mock_hv", "get", Some(0)).is_err())
            .count();
        assert!(failures > 400 && failures < 600, "Got {} failures", failures);
    }

    #[test]
    fn test_fail_after_n() {
        let config = ErrorConfig::scenario(ErrorScenario::FailAfterN {
            operation: "set",
            count: 3,
        });
        for _ in 0..3 {
            assert!(config.check_operation("mock_hv", "set", Some(0)).is_ok());
        }
        assert!(config.check_operation("mock_hv", "set", Some(0)).is_err());
        assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
    }

    #[test]
    fn test_timeout_scenario() {
        let config = ErrorConfig::scenario(ErrorScenario::Timeout { operation: "ramp" });
        let err = config
            .check_operation("mock_hv", "ramp", Some(1))
            .unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::Timeout);
        assert!(err.message.contains("timed out"));
    }

    #[test]
    fn test_channel_fault_only_hits_that_channel() {
        let config = ErrorConfig::scenario(ErrorScenario::ChannelFault { channel: 2 });
        assert!(config.check_operation("mock_hv", "get", Some(2)).is_err());
        assert!(config.check_operation("mock_hv", "status", Some(2)).is_err());
        assert!(config.check_operation("mock_hv", "get", Some(1)).is_ok());
        assert!(config.check_operation("mock_hv", "identify", None).is_ok());
    }

    #[test]
    fn test_communication_loss_latches() {
        let config = ErrorConfig::scenario(ErrorScenario::CommunicationLoss);
        let err = config
            .check_operation("mock_hv", "get", Some(0))
            .unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::Communication);
        assert!(config.check_operation("mock_hv", "set", Some(1)).is_err());
    }

    #[test]
    fn test_hardware_fault() {
        let config = ErrorConfig::scenario(ErrorScenario::HardwareFault { code: 0x42 });
        let err = config
            .check_operation("mock_hv", "status", Some(0))
            .unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::Hardware);
        assert!(err.message.contains("66"));
    }

    #[test]
    fn test_reset() {
        let config = ErrorConfig::scenario(ErrorScenario::FailAfterN {
            operation: "get",
            count: 2,
        });
        assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
        assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
        assert!(config.check_operation("mock_hv", "get", Some(0)).is_err());

        config.reset();

        assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
    }

    #[test]
    fn test_custom_rates() {
        let mut rates = HashMap::new();
        rates.insert("set", 1.0);
        rates.insert("get", 0.0);
        let config = ErrorConfig::with_rates(rates);
        for _ in 0..10 {
            assert!(config.check_operation("mock_hv", "set", Some(0)).is_err());
            assert!(config.check_operation("mock_hv", "get", Some(0)).is_ok());
        }
    }
}
