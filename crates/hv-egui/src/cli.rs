//! Command-line options.

use std::path::PathBuf;

use clap::Parser;
use hv_control::config::DEFAULT_CONFIG_FILE;
use hv_control::ControlSettings;
use hv_core::ConnectionKind;

/// CAEN desktop HV power supply control panel
#[derive(Parser, Debug, Clone)]
#[command(name = "caen-hv-gui", version, about)]
pub struct Cli {
    /// Settings file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Serial port or IP address to prefill
    #[arg(short, long)]
    pub address: Option<String>,

    /// Connect over Ethernet instead of USB
    #[arg(long)]
    pub ethernet: bool,

    /// Board address on a daisy chain
    #[arg(long)]
    pub device_id: Option<u8>,

    /// Number of channels of the simulated supply
    #[arg(long)]
    pub channels: Option<usize>,

    /// Tracing filter, e.g. `debug` or `hv_control=trace`
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut ControlSettings) {
        if self.ethernet {
            settings.connection.kind = ConnectionKind::Ethernet;
            if self.address.is_none() {
                settings.connection.address = ConnectionKind::Ethernet.default_address().to_string();
            }
        }
        if let Some(address) = &self.address {
            settings.connection.address = address.clone();
        }
        if let Some(id) = self.device_id {
            settings.connection.device_id = Some(id);
        }
        if let Some(channels) = self.channels {
            settings.simulator.channels = channels;
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}
