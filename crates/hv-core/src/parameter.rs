//! Named channel parameters and their unit handling.
//!
//! The supply speaks volts and volts-per-second, but reports and accepts
//! currents in microamps. Everything above the session handle works in SI
//! units (amperes), so the conversion lives here and nowhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Microamps per ampere.
const MICROAMPS_PER_AMP: f64 = 1e6;

/// A per-channel parameter of the supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Parameter {
    /// Voltage setpoint
    Vset,
    /// Measured voltage
    Vmon,
    /// Current limit
    Iset,
    /// Measured current
    Imon,
    /// Ramp-up rate
    Rup,
    /// Ramp-down rate
    Rdw,
    /// Software voltage limit
    Maxv,
}

impl Parameter {
    /// Parameters the user may write, in the order the UI lists them.
    pub const SETTABLE: [Parameter; 5] = [
        Parameter::Vset,
        Parameter::Iset,
        Parameter::Rup,
        Parameter::Rdw,
        Parameter::Maxv,
    ];

    /// Wire name used by the device.
    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Vset => "VSET",
            Parameter::Vmon => "VMON",
            Parameter::Iset => "ISET",
            Parameter::Imon => "IMON",
            Parameter::Rup => "RUP",
            Parameter::Rdw => "RDW",
            Parameter::Maxv => "MAXV",
        }
    }

    /// Unit of the SI value shown to the user.
    pub fn unit(&self) -> &'static str {
        match self {
            Parameter::Vset | Parameter::Vmon | Parameter::Maxv => "V",
            Parameter::Iset | Parameter::Imon => "A",
            Parameter::Rup | Parameter::Rdw => "V/s",
        }
    }

    pub fn is_settable(&self) -> bool {
        !matches!(self, Parameter::Vmon | Parameter::Imon)
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Parameter::Iset | Parameter::Imon)
    }

    /// Convert an SI value into the unit the device expects.
    pub fn to_device(&self, si_value: f64) -> f64 {
        if self.is_current() {
            si_value * MICROAMPS_PER_AMP
        } else {
            si_value
        }
    }

    /// Convert a value reported by the device into SI units.
    pub fn from_device(&self, device_value: f64) -> f64 {
        if self.is_current() {
            device_value / MICROAMPS_PER_AMP
        } else {
            device_value
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VSET" => Ok(Parameter::Vset),
            "VMON" => Ok(Parameter::Vmon),
            "ISET" => Ok(Parameter::Iset),
            "IMON" => Ok(Parameter::Imon),
            "RUP" => Ok(Parameter::Rup),
            "RDW" => Ok(Parameter::Rdw),
            "MAXV" => Ok(Parameter::Maxv),
            _ => Err(ValidationError::UnknownParameter(s.to_string())),
        }
    }
}
