//! `hv-control`
//!
//! Poll-and-dispatch coordinator for the CAEN desktop HV control panel.
//!
//! The presentation layer owns a [`Coordinator`] and calls it from its own
//! thread. The coordinator spawns device work on tokio, receives results as
//! [`UiEvent`]s and applies them to [`DisplayState`] when the presentation
//! layer calls [`Coordinator::process_events`].
//!
//! ## Modules
//!
//! - [`config`]: Figment-loaded settings
//! - [`coordinator`]: connection, monitoring and command dispatch
//! - [`display`]: channel table, status fields and error notices
//! - [`events`]: messages from background tasks
//! - [`log`]: the timestamped event log
//! - [`monitor`]: monitor state machine and tick loop

pub mod config;
pub mod coordinator;
mod dispatch;
pub mod display;
pub mod events;
pub mod log;
pub mod monitor;
mod refresh;

pub use config::{ConfigError, ControlSettings};
pub use coordinator::Coordinator;
pub use display::{ChannelRow, ConnectionStatus, DisplayState, ErrorNotice, MonitorStatus};
pub use events::UiEvent;
pub use log::{EventLog, LogEntry, LogLevel};
pub use monitor::MonitorState;
pub use refresh::RefreshOutcome;
