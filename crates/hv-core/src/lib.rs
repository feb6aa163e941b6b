//! `hv-core`
//!
//! Core types and the device-session seam for the CAEN desktop high-voltage
//! control front-end.
//!
//! ## Key Types
//!
//! - [`HvSession`]: async trait a power-supply driver implements
//! - [`SessionFactory`]: opens sessions from a [`ConnectionTarget`]
//! - [`SessionHandle`]: cloneable, mutex-guarded, cancellable access to the
//!   active session, working in SI units
//! - [`ChannelReading`]: one snapshot of a channel
//! - [`Command`] / [`Limits`]: validated device writes
//! - [`HvError`] / [`DriverError`]: error types

pub mod command;
pub mod error;
pub mod handle;
pub mod parameter;
pub mod reading;
pub mod session;

pub use command::{
    parse_value, Command, Limits, PendingCommand, CURRENT_PRESETS_UA, VOLTAGE_PRESETS,
};
pub use error::{DriverError, DriverErrorKind, HvError, HvResult, ValidationError};
pub use handle::SessionHandle;
pub use parameter::Parameter;
pub use reading::{
    format_amps, format_volts, ChannelIndicator, ChannelReading, ChannelStatus, OutputState,
};
pub use session::{ConnectionKind, ConnectionTarget, DeviceIdentity, HvSession, SessionFactory};
