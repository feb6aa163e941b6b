//! One refresh pass over every channel of a session.

use hv_core::SessionHandle;

use crate::events::{Outbox, UiEvent};
use crate::log::LogEntry;

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every channel was attempted; `failed` of them could not be read.
    Completed { failed: usize },
    /// The session was closed mid-pass.
    Cancelled,
}

/// Read every channel in order and deliver each result as soon as it is ready.
///
/// Passes on the same session hold the refresh gate, so they never interleave.
/// A channel that fails is reported and zeroed; the pass continues with the
/// next one. Cancellation ends the pass silently.
pub(crate) async fn refresh_pass(session: &SessionHandle, outbox: &Outbox) -> RefreshOutcome {
    let epoch = outbox.epoch();
    let Ok(_gate) = session.begin_refresh().await else {
        return RefreshOutcome::Cancelled;
    };

    outbox.log(LogEntry::info("Refreshing channel status..."));

    let mut failed = 0;
    for channel in 0..session.channel_count() {
        match session.read_channel(channel).await {
            Ok(reading) => {
                tracing::debug!(
                    channel,
                    vset = reading.vset,
                    vmon = reading.vmon,
                    output = reading.output.as_str(),
                    "Channel read"
                );
                outbox.send(UiEvent::Reading { epoch, reading });
            }
            Err(e) if e.is_cancelled() => return RefreshOutcome::Cancelled,
            Err(error) => {
                failed += 1;
                outbox.send(UiEvent::ChannelFailed {
                    epoch,
                    channel,
                    error,
                });
            }
        }
    }

    outbox.send(UiEvent::RefreshCompleted { epoch });
    RefreshOutcome::Completed { failed }
}
