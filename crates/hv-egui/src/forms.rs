//! Editable form state behind the panels.

use hv_core::{ConnectionKind, ConnectionTarget, Parameter};

/// Connection bar contents.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionForm {
    pub kind: ConnectionKind,
    pub address: String,
    pub device_id: String,
}

impl ConnectionForm {
    pub fn from_target(target: &ConnectionTarget) -> Self {
        Self {
            kind: target.kind,
            address: target.address.clone(),
            device_id: target.device_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    /// Switch kind, resetting the address to that kind's default.
    pub fn set_kind(&mut self, kind: ConnectionKind) {
        if self.kind != kind {
            self.kind = kind;
            self.address = kind.default_address().to_string();
        }
    }

    /// An empty device id means none.
    pub fn target(&self) -> Result<ConnectionTarget, String> {
        let device_id = match self.device_id.trim() {
            "" => None,
            text => Some(
                text.parse::<u8>()
                    .map_err(|_| format!("Invalid device ID: '{}'", text))?,
            ),
        };
        Ok(ConnectionTarget {
            kind: self.kind,
            address: self.address.trim().to_string(),
            device_id,
        })
    }
}

/// "Set Parameters" form.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterForm {
    pub channel: usize,
    pub parameter: Parameter,
    pub value: String,
}

impl Default for ParameterForm {
    fn default() -> Self {
        Self {
            channel: 0,
            parameter: Parameter::Vset,
            value: "0.0".to_string(),
        }
    }
}

impl ParameterForm {
    pub fn unit(&self) -> &'static str {
        self.parameter.unit()
    }

    /// Keep the selected channel valid for the connected device.
    pub fn clamp_channel(&mut self, channel_count: usize) {
        if self.channel >= channel_count {
            self.channel = 0;
        }
    }

    /// Fill the form the way a preset button does.
    pub fn preset(&mut self, parameter: Parameter, value: f64) {
        self.parameter = parameter;
        self.value = value.to_string();
    }
}

/// "Quick Voltage Ramp" form.
#[derive(Debug, Clone, PartialEq)]
pub struct RampForm {
    pub target: String,
    pub rate: String,
}

impl Default for RampForm {
    fn default() -> Self {
        Self {
            target: "0.0".to_string(),
            rate: "5.0".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_switch_resets_address() {
        let mut form = ConnectionForm::from_target(&ConnectionTarget::default());
        form.address = "/dev/ttyUSB3".to_string();
        form.set_kind(ConnectionKind::Ethernet);
        assert_eq!(form.address, "192.168.1.100");
        form.set_kind(ConnectionKind::Usb);
        assert_eq!(form.address, "/dev/ttyACM0");
    }

    #[test]
    fn test_device_id_parsing() {
        let mut form = ConnectionForm::from_target(&ConnectionTarget::default());
        assert_eq!(form.target().unwrap().device_id, Some(0));
        form.device_id = " ".to_string();
        assert_eq!(form.target().unwrap().device_id, None);
        form.device_id = "x1".to_string();
        assert!(form.target().is_err());
    }

    #[test]
    fn test_units_follow_parameter() {
        let mut form = ParameterForm::default();
        assert_eq!(form.unit(), "V");
        form.preset(Parameter::Iset, 5e-6);
        assert_eq!(form.unit(), "A");
        assert_eq!(form.value, "0.000005");
        form.parameter = Parameter::Rup;
        assert_eq!(form.unit(), "V/s");
    }

    #[test]
    fn test_clamp_channel() {
        let mut form = ParameterForm {
            channel: 5,
            ..Default::default()
        };
        form.clamp_channel(4);
        assert_eq!(form.channel, 0);
    }
}
