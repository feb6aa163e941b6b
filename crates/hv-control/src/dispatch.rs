//! Background execution of validated commands.

use std::time::Duration;

use hv_core::{Command, HvResult, SessionHandle};

use crate::events::{Outbox, UiEvent};
use crate::refresh::refresh_pass;

/// Perform one command against the device.
pub(crate) async fn execute(session: &SessionHandle, command: Command) -> HvResult<()> {
    match command {
        Command::Set(pending) => {
            session
                .set(pending.parameter, pending.channel, pending.value)
                .await
        }
        Command::Ramp {
            channel,
            target_volts,
            rate,
        } => session.ramp(channel, target_volts, rate).await,
        Command::Output { channel, state } => session.set_output(channel, state).await,
    }
}

/// Run `commands` in order, reporting each outcome, then refresh once.
///
/// A failing command does not stop the ones after it. The follow-up refresh
/// runs `refresh_delay` after the last command completed, and only if at
/// least one succeeded. Cancellation ends the batch without reporting.
pub(crate) async fn run_commands(
    session: SessionHandle,
    commands: Vec<Command>,
    refresh_delay: Duration,
    outbox: Outbox,
) {
    let epoch = outbox.epoch();
    let mut any_succeeded = false;

    for command in commands {
        match execute(&session, command).await {
            Ok(()) => {
                any_succeeded = true;
                outbox.send(UiEvent::CommandCompleted { epoch, command });
            }
            Err(e) if e.is_cancelled() => return,
            Err(error) => outbox.send(UiEvent::CommandFailed {
                epoch,
                command,
                error,
            }),
        }
    }

    if any_succeeded {
        let cancel = session.cancellation();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(refresh_delay) => {}
        }
        refresh_pass(&session, &outbox).await;
    }
}
