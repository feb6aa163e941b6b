//! Commands the user can send to a channel, and their validation.
//!
//! Validation is synchronous and happens on the caller's thread before any
//! background work is spawned. A command that comes out of
//! [`Limits::validate_set`] or [`Limits::validate_ramp`] is known to be in range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::parameter::Parameter;
use crate::reading::OutputState;

/// Fixed voltage shortcuts (V).
pub const VOLTAGE_PRESETS: [f64; 5] = [50.0, 100.0, 200.0, 500.0, 1000.0];

/// Fixed current-limit shortcuts (µA).
pub const CURRENT_PRESETS_UA: [f64; 5] = [1.0, 5.0, 10.0, 50.0, 100.0];

/// A `(channel, parameter, value)` write waiting to be performed. Value in SI units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub channel: usize,
    pub parameter: Parameter,
    pub value: f64,
}

/// Anything that changes device state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Set(PendingCommand),
    Ramp {
        channel: usize,
        target_volts: f64,
        rate: f64,
    },
    Output {
        channel: usize,
        state: OutputState,
    },
}

impl Command {
    pub fn channel(&self) -> usize {
        match self {
            Command::Set(pending) => pending.channel,
            Command::Ramp { channel, .. } | Command::Output { channel, .. } => *channel,
        }
    }

    /// Log line written when the command completes.
    pub fn success_message(&self) -> String {
        match self {
            Command::Set(_) => "Parameter set successfully".to_string(),
            Command::Ramp { .. } => "Voltage ramp completed".to_string(),
            Command::Output { channel, state } => match state {
                OutputState::On => format!("Turn ON CH{}", channel),
                OutputState::Off => format!("Turn OFF CH{}", channel),
            },
        }
    }

    /// Prefix for the log line written when the command fails.
    pub fn failure_context(&self) -> String {
        match self {
            Command::Set(pending) => {
                format!("Error setting CH{} {}", pending.channel, pending.parameter)
            }
            Command::Ramp { channel, .. } => format!("Ramp error on CH{}", channel),
            Command::Output { channel, state } => match state {
                OutputState::On => format!("Error turning on CH{}", channel),
                OutputState::Off => format!("Error turning off CH{}", channel),
            },
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Set(p) => write!(f, "Setting CH{} {} = {}", p.channel, p.parameter, p.value),
            Command::Ramp {
                channel,
                target_volts,
                rate,
            } => write!(f, "Ramping CH{} to {}V at {}V/s", channel, target_volts, rate),
            Command::Output { channel, state } => {
                write!(f, "Switching CH{} {}", channel, state.as_str())
            }
        }
    }
}

/// Parse user text into a finite number.
pub fn parse_value(text: &str) -> Result<f64, ValidationError> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::InvalidNumber {
            input: text.to_string(),
        }),
    }
}

/// Accepted value ranges for settable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound for VSET, MAXV and ramp targets (V)
    pub vset_max_volts: f64,
    /// Upper bound for ISET (A)
    pub iset_max_amps: f64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            vset_max_volts: 5000.0,
            iset_max_amps: 1e-3,
        }
    }
}

impl Limits {
    fn volts_range(&self) -> String {
        format!("0 and {}V", self.vset_max_volts)
    }

    /// Range check for an already parsed SI value.
    pub fn check(&self, parameter: Parameter, value: f64) -> Result<(), ValidationError> {
        if !parameter.is_settable() {
            return Err(ValidationError::ReadOnlyParameter(parameter.name()));
        }
        if !value.is_finite() {
            return Err(ValidationError::InvalidNumber {
                input: value.to_string(),
            });
        }

        let out_of_range = |range: String| ValidationError::OutOfRange {
            parameter: parameter.name(),
            value,
            range,
        };

        match parameter {
            Parameter::Vset | Parameter::Maxv => {
                if !(0.0..=self.vset_max_volts).contains(&value) {
                    return Err(out_of_range(self.volts_range()));
                }
            }
            Parameter::Iset => {
                if !(0.0..=self.iset_max_amps).contains(&value) {
                    return Err(out_of_range(format!(
                        "0 and {}mA",
                        self.iset_max_amps * 1e3
                    )));
                }
            }
            Parameter::Rup | Parameter::Rdw => {
                if value < 0.0 {
                    return Err(ValidationError::Negative {
                        parameter: parameter.name(),
                        value,
                    });
                }
            }
            Parameter::Vmon | Parameter::Imon => {}
        }
        Ok(())
    }

    /// Validate a parameter write typed by the user.
    pub fn validate_set(
        &self,
        channel: usize,
        parameter: Parameter,
        value_text: &str,
    ) -> Result<Command, ValidationError> {
        let value = parse_value(value_text)?;
        self.check(parameter, value)?;
        Ok(Command::Set(PendingCommand {
            channel,
            parameter,
            value,
        }))
    }

    /// Validate a ramp typed by the user.
    pub fn validate_ramp(
        &self,
        channel: usize,
        target_text: &str,
        rate_text: &str,
    ) -> Result<Command, ValidationError> {
        let target_volts = parse_value(target_text)?;
        let rate = parse_value(rate_text)?;

        if !(0.0..=self.vset_max_volts).contains(&target_volts) {
            return Err(ValidationError::OutOfRange {
                parameter: "Ramp target",
                value: target_volts,
                range: self.volts_range(),
            });
        }
        if rate <= 0.0 {
            return Err(ValidationError::InvalidRampRate { rate });
        }

        Ok(Command::Ramp {
            channel,
            target_volts,
            rate,
        })
    }
}
