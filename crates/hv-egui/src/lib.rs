//! egui front-end for the CAEN desktop HV control panel.
//!
//! The window is a thin layer over [`hv_control::Coordinator`]: widgets read
//! [`hv_control::DisplayState`] and call coordinator methods, and each frame
//! starts by applying whatever the background tasks reported.

pub mod app;
pub mod cli;
pub mod forms;
mod panels;

pub use app::HvApp;
pub use cli::Cli;
