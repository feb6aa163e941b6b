//! The device session seam.
//!
//! An [`HvSession`] is a live connection to one power supply. The workspace
//! never talks to the transport itself: a driver crate implements this trait
//! (the simulator in `hv-driver-mock`, or a binding to the vendor library) and
//! a [`SessionFactory`] opens it from a [`ConnectionTarget`].
//!
//! Values crossing this trait are in **device units**: volts, volts per second
//! and microamps. Conversion to SI happens in
//! [`SessionHandle`](crate::handle::SessionHandle).
//!
//! Methods take `&mut self`. The handle keeps the session behind an async
//! mutex, so an implementation never sees two calls at once.

use std::fmt;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::DriverError;
use crate::parameter::Parameter;
use crate::reading::{ChannelStatus, OutputState};

/// Identity reported by the device right after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Identification string (model, serial, firmware)
    pub model: String,
    pub channel_count: usize,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} channels)", self.model, self.channel_count)
    }
}

/// A live connection to one power supply.
#[async_trait]
pub trait HvSession: Send {
    /// Query identification string and channel count.
    async fn identify(&mut self) -> Result<DeviceIdentity, DriverError>;

    /// Read a parameter in device units.
    async fn get(&mut self, parameter: Parameter, channel: usize) -> Result<f64, DriverError>;

    /// Write a parameter in device units.
    async fn set(
        &mut self,
        parameter: Parameter,
        channel: usize,
        value: f64,
    ) -> Result<(), DriverError>;

    /// Read the status block of a channel.
    async fn status(&mut self, channel: usize) -> Result<ChannelStatus, DriverError>;

    /// Switch the output stage of a channel.
    async fn set_output(&mut self, channel: usize, state: OutputState) -> Result<(), DriverError>;

    /// Move a channel to `target_volts` at `rate` V/s.
    ///
    /// Implementations may return once the ramp is started or block until it
    /// finishes.
    async fn ramp(&mut self, channel: usize, target_volts: f64, rate: f64)
        -> Result<(), DriverError>;

    /// Release the connection. The default does nothing.
    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Physical link used to reach the supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    #[default]
    Usb,
    Ethernet,
}

impl ConnectionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionKind::Usb => "USB",
            ConnectionKind::Ethernet => "Ethernet",
        }
    }

    /// Address pre-filled when the user switches to this kind.
    pub fn default_address(&self) -> &'static str {
        match self {
            ConnectionKind::Usb => "/dev/ttyACM0",
            ConnectionKind::Ethernet => "192.168.1.100",
        }
    }
}

/// Where to connect: a serial port path or an IP address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTarget {
    pub kind: ConnectionKind,
    pub address: String,
    /// Board address on a daisy chain, if any
    pub device_id: Option<u8>,
}

impl Default for ConnectionTarget {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::Usb,
            address: ConnectionKind::Usb.default_address().to_string(),
            device_id: Some(0),
        }
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self
            .device_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "{} (Device ID: {}) using {}",
            self.address,
            id,
            self.kind.label()
        )
    }
}

/// Opens sessions.
///
/// Factories live for the whole program and may be called from any task, so
/// `open` returns a `'static` future and takes the target by value.
pub trait SessionFactory: Send + Sync + 'static {
    /// Driver name for logs, e.g. `"mock_hv"`.
    fn driver_type(&self) -> &'static str;

    fn open(
        &self,
        target: ConnectionTarget,
    ) -> BoxFuture<'static, Result<Box<dyn HvSession>, DriverError>>;
}
