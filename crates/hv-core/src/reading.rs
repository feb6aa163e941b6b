//! Per-channel snapshots produced by a refresh.

use serde::{Deserialize, Serialize};

/// Output stage state of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    On,
    #[default]
    Off,
}

impl OutputState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputState::On => "on",
            OutputState::Off => "off",
        }
    }
}

/// Status block reported by the device for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelStatus {
    pub output: OutputState,
    pub ramping_up: bool,
    pub ramping_down: bool,
    /// Latched overcurrent (trip) flag
    pub overcurrent: bool,
}

/// One complete reading of a channel, in SI units.
///
/// Produced fresh on every refresh and never persisted. A later reading for
/// the same channel replaces it entirely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelReading {
    pub channel: usize,
    /// Voltage setpoint (V)
    pub vset: f64,
    /// Measured voltage (V)
    pub vmon: f64,
    /// Current limit (A)
    pub iset: f64,
    /// Measured current (A)
    pub imon: f64,
    pub output: OutputState,
    pub ramping_up: bool,
    pub ramping_down: bool,
    pub overcurrent: bool,
}

impl ChannelReading {
    /// Reading shown for a channel whose read failed.
    pub fn zeroed(channel: usize) -> Self {
        Self {
            channel,
            vset: 0.0,
            vmon: 0.0,
            iset: 0.0,
            imon: 0.0,
            output: OutputState::Off,
            ramping_up: false,
            ramping_down: false,
            overcurrent: false,
        }
    }

    pub fn with_status(mut self, status: ChannelStatus) -> Self {
        self.output = status.output;
        self.ramping_up = status.ramping_up;
        self.ramping_down = status.ramping_down;
        self.overcurrent = status.overcurrent;
        self
    }

    pub fn is_ramping(&self) -> bool {
        self.ramping_up || self.ramping_down
    }

    /// Indicator shown in the status column. Overcurrent wins over ramping,
    /// ramping wins over the plain output state.
    pub fn indicator(&self) -> ChannelIndicator {
        if self.overcurrent {
            ChannelIndicator::Overcurrent
        } else if self.is_ramping() {
            ChannelIndicator::Ramping
        } else if self.output == OutputState::On {
            ChannelIndicator::On
        } else {
            ChannelIndicator::Off
        }
    }
}

/// Condensed channel state for the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelIndicator {
    Overcurrent,
    Ramping,
    On,
    Off,
}

impl ChannelIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelIndicator::Overcurrent => "OVERCUR",
            ChannelIndicator::Ramping => "RAMPING",
            ChannelIndicator::On => "ON",
            ChannelIndicator::Off => "OFF",
        }
    }
}

/// Format a voltage the way the channel table shows it.
pub fn format_volts(volts: f64) -> String {
    format!("{:.1}", volts)
}

/// Format a current (A) the way the channel table shows it.
pub fn format_amps(amps: f64) -> String {
    format!("{:.2e}", amps)
}
