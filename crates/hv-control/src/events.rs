//! Messages from background tasks to the presentation layer.
//!
//! Background tasks never touch display state. They send [`UiEvent`]s down an
//! unbounded channel and the coordinator applies them when the UI drains it.

use hv_core::{ChannelReading, Command, ConnectionTarget, HvError, SessionHandle};
use tokio::sync::mpsc;

use crate::log::LogEntry;

pub type EventSender = mpsc::UnboundedSender<UiEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Result of background work, stamped with the session epoch it belongs to.
#[derive(Debug)]
pub enum UiEvent {
    /// A connect attempt finished and the device identified itself.
    Connected {
        session: SessionHandle,
        target: ConnectionTarget,
    },
    ConnectFailed {
        epoch: u64,
        target: ConnectionTarget,
        error: HvError,
    },
    /// Fresh reading for one channel.
    Reading { epoch: u64, reading: ChannelReading },
    /// A channel could not be read during a refresh pass.
    ChannelFailed {
        epoch: u64,
        channel: usize,
        error: HvError,
    },
    /// Every channel of a pass has been delivered.
    RefreshCompleted { epoch: u64 },
    /// The monitor loop started a tick.
    MonitorTick { epoch: u64, generation: u64 },
    /// The monitor loop exited.
    MonitorStopped { epoch: u64, generation: u64 },
    CommandCompleted { epoch: u64, command: Command },
    CommandFailed {
        epoch: u64,
        command: Command,
        error: HvError,
    },
    /// Free-form log line from a task.
    Log { epoch: u64, entry: LogEntry },
}

impl UiEvent {
    /// Connection epoch the event belongs to.
    pub fn epoch(&self) -> u64 {
        match self {
            UiEvent::Connected { session, .. } => session.epoch(),
            UiEvent::ConnectFailed { epoch, .. }
            | UiEvent::Reading { epoch, .. }
            | UiEvent::ChannelFailed { epoch, .. }
            | UiEvent::RefreshCompleted { epoch }
            | UiEvent::MonitorTick { epoch, .. }
            | UiEvent::MonitorStopped { epoch, .. }
            | UiEvent::CommandCompleted { epoch, .. }
            | UiEvent::CommandFailed { epoch, .. }
            | UiEvent::Log { epoch, .. } => *epoch,
        }
    }
}

/// Send half used by tasks bound to one session.
#[derive(Debug, Clone)]
pub(crate) struct Outbox {
    tx: EventSender,
    epoch: u64,
}

impl Outbox {
    pub(crate) fn new(tx: EventSender, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Send an event; a closed channel means the UI is gone and is ignored.
    pub(crate) fn send(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }

    pub(crate) fn log(&self, entry: LogEntry) {
        self.send(UiEvent::Log {
            epoch: self.epoch,
            entry,
        });
    }
}
