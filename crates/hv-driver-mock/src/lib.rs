//! Simulated CAEN desktop high-voltage supply.
//!
//! This crate provides a stand-in for the real hardware so the control panel
//! and its coordinator can run and be tested without a supply on the desk.
//! All simulated delays use `tokio::time::sleep`, so tests can run on a
//! paused clock.
//!
//! # Performance Characteristics
//!
//! - Instant mode: no delays, output jumps to VSET
//! - Realistic mode: USB-like transport delay (15 ms + 5 ms settle), ramping
//!   at RUP/RDW, ~0.2 V noise on VMON
//!
//! # Session Factory
//!
//! [`MockHvFactory`] implements [`hv_core::SessionFactory`]; every session it
//! opens talks to the same simulated supply.
//!
//! ```rust,ignore
//! use hv_driver_mock::{MockHvFactory, MockHvSupply};
//!
//! let supply = MockHvSupply::builder().channels(4).build();
//! let factory = MockHvFactory::new(supply.clone());
//! // hand `factory` to the coordinator, keep `supply` to inspect the journal
//! ```

pub mod common;
mod mock_supply;

// Re-export common types
pub use common::{
    CallJournal, ErrorConfig, ErrorScenario, MockCall, MockMode, MockRng, TimingConfig,
};

pub use mock_supply::{MockHvConfig, MockHvFactory, MockHvSupply, MockHvSupplyBuilder};
