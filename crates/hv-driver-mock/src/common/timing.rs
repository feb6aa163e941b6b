//! Timing configuration for realistic mode.

use std::time::Duration;

/// Delays applied to every call in realistic mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// Round trip for one command/response exchange, in milliseconds
    pub communication_delay_ms: u64,
    /// Extra time for a write to be acknowledged, in milliseconds
    pub settling_time_ms: u64,
}

impl TimingConfig {
    /// Typical USB (virtual serial port) link
    pub fn usb() -> Self {
        Self {
            communication_delay_ms: 15,
            settling_time_ms: 5,
        }
    }

    /// Typical Ethernet link
    pub fn ethernet() -> Self {
        Self {
            communication_delay_ms: 5,
            settling_time_ms: 5,
        }
    }

    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.communication_delay_ms)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.communication_delay_ms + self.settling_time_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            communication_delay_ms: 0,
            settling_time_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let config = TimingConfig::default();
        assert_eq!(config.read_delay(), Duration::ZERO);
        assert_eq!(config.write_delay(), Duration::ZERO);
    }

    #[test]
    fn test_usb_timing() {
        let config = TimingConfig::usb();
        assert_eq!(config.read_delay(), Duration::from_millis(15));
        assert_eq!(config.write_delay(), Duration::from_millis(20));
    }
}
