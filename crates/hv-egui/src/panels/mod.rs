//! Panels drawn each frame. Each reads display state and calls the coordinator.

pub mod channels;
pub mod connection;
pub mod controls;
pub mod dialogs;
pub mod log;
pub mod parameters;
pub mod presets;

use hv_core::HvResult;

/// Coordinator calls already surface failures in the display; just trace them.
pub(crate) fn traced<T>(action: &str, result: HvResult<T>) {
    if let Err(e) = result {
        tracing::debug!("{} not sent: {}", action, e);
    }
}
