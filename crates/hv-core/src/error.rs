//! Error types shared by every crate in the workspace.
//!
//! Two layers exist:
//!
//! - **`DriverError`**: what an [`HvSession`](crate::session::HvSession)
//!   implementation reports when the transport or the device misbehaves. It
//!   carries the driver type and a coarse [`DriverErrorKind`] so that logs stay
//!   readable without knowing which driver is plugged in.
//! - **`HvError`**: what the session handle and the coordinator return. It wraps
//!   driver failures and adds the conditions that only exist above the driver:
//!   rejected input, a missing session, or an operation cancelled by disconnect.

use thiserror::Error;

// =============================================================================
// Driver Errors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    Connection,
    Communication,
    Protocol,
    Hardware,
    Timeout,
    InvalidParameter,
    Unknown,
}

impl std::fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DriverErrorKind::Connection => "connection",
            DriverErrorKind::Communication => "communication",
            DriverErrorKind::Protocol => "protocol",
            DriverErrorKind::Hardware => "hardware",
            DriverErrorKind::Timeout => "timeout",
            DriverErrorKind::InvalidParameter => "invalid_parameter",
            DriverErrorKind::Unknown => "unknown",
        };
        write!(f, "{}", label)
    }
}

#[derive(Error, Debug, Clone)]
#[error("Driver '{driver_type}' {kind} error: {message}")]
pub struct DriverError {
    pub driver_type: String,
    pub kind: DriverErrorKind,
    pub message: String,
}

impl DriverError {
    pub fn new(
        driver_type: impl Into<String>,
        kind: DriverErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            driver_type: driver_type.into(),
            kind,
            message: message.into(),
        }
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Rejected user input. Raised before any device call is made.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The value text could not be parsed as a finite number.
    #[error("Invalid value: '{input}' is not a number")]
    InvalidNumber { input: String },

    /// The value parsed but lies outside the accepted range.
    ///
    /// `range` is the human-readable bound, e.g. `"0 and 5000V"`.
    #[error("{parameter} must be between {range}")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        range: String,
    },

    /// A rate parameter (RUP/RDW) was given a negative value.
    #[error("{parameter} must be non-negative (got {value} V/s)")]
    Negative { parameter: &'static str, value: f64 },

    /// A ramp was requested with a zero, negative or non-finite rate.
    #[error("Ramp rate must be greater than 0 V/s (got {rate})")]
    InvalidRampRate { rate: f64 },

    /// The parameter is read-only (monitor values) or unknown.
    #[error("Parameter {0} cannot be set")]
    ReadOnlyParameter(&'static str),

    /// The parameter name does not exist.
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    /// The channel index is not below the connected channel count.
    #[error("Channel {channel} does not exist (device has {channel_count} channels)")]
    UnknownChannel { channel: usize, channel_count: usize },
}

// =============================================================================
// Session / Coordinator Errors
// =============================================================================

/// Convenience alias for results using [`HvError`].
pub type HvResult<T> = std::result::Result<T, HvError>;

/// Primary error type above the driver layer.
#[derive(Error, Debug, Clone)]
pub enum HvError {
    /// The device or its transport failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Input was rejected before reaching the device.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An operation that needs a session was attempted while disconnected.
    #[error("Not connected to device")]
    NotConnected,

    /// The session was disconnected while the operation was waiting or in flight.
    #[error("Operation cancelled: session closed")]
    Cancelled,
}

impl HvError {
    /// True for errors that are a consequence of disconnecting rather than a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HvError::Cancelled)
    }
}
