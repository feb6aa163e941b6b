//! Automatic polling.
//!
//! The monitor is a small state machine owned by the coordinator:
//!
//! ```text
//!   Idle --start--> Running --stop--> Stopping --loop exits--> Idle
//!                      |                                        ^
//!                      +------- loop exits (session closed) ----+
//! ```
//!
//! Each start spawns a fresh loop task with its own generation number and a
//! cancellation token derived from the session's. Events from a loop whose
//! generation is no longer current are ignored, so a slow-to-exit loop can't
//! flip the display of its successor.

use std::time::Duration;

use hv_core::SessionHandle;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;

use crate::events::{Outbox, UiEvent};
use crate::refresh::refresh_pass;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorState {
    /// No loop task exists
    Idle,
    /// A loop task is ticking; its events carry `generation`
    Running { generation: u64 },
    /// Cancelled, waiting for the loop's `MonitorStopped` report
    Stopping { generation: u64 },
}

#[derive(Debug)]
pub struct Monitor {
    state: MonitorState,
    cancel: Option<CancellationToken>,
    next_generation: u64,
    interval: Duration,
}

impl Monitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: MonitorState::Idle,
            cancel: None,
            next_generation: 1,
            interval,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, MonitorState::Running { .. })
    }

    /// Spawn the tick loop for `session`. No-op while already running.
    ///
    /// Starting while a previous loop is still stopping is allowed; the old
    /// loop's generation is simply retired.
    pub(crate) fn start(&mut self, runtime: &Handle, session: &SessionHandle, outbox: Outbox) {
        if self.is_running() {
            return;
        }
        let generation = self.next_generation;
        self.next_generation += 1;

        let cancel = session.cancellation().child_token();
        self.cancel = Some(cancel.clone());
        self.state = MonitorState::Running { generation };

        tracing::debug!(generation, "Starting monitor loop");
        runtime.spawn(run_monitor(
            session.clone(),
            generation,
            cancel,
            self.interval,
            outbox,
        ));
    }

    /// Ask the running loop to exit. A pass already in flight completes.
    pub(crate) fn stop(&mut self) {
        if let MonitorState::Running { generation } = self.state {
            if let Some(cancel) = self.cancel.take() {
                cancel.cancel();
            }
            tracing::debug!(generation, "Stopping monitor loop");
            self.state = MonitorState::Stopping { generation };
        }
    }

    /// Forget the loop entirely, e.g. because its session is going away.
    /// Its remaining events are dropped with the session's epoch.
    pub(crate) fn reset(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.state = MonitorState::Idle;
    }

    /// Whether a tick from `generation` belongs to the current loop.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        matches!(self.state, MonitorState::Running { generation: g } if g == generation)
    }

    /// Record that the loop of `generation` exited.
    ///
    /// Returns `true` if that was the current loop and the monitor is now idle.
    pub(crate) fn on_stopped(&mut self, generation: u64) -> bool {
        match self.state {
            MonitorState::Running { generation: g } | MonitorState::Stopping { generation: g }
                if g == generation =>
            {
                self.cancel = None;
                self.state = MonitorState::Idle;
                true
            }
            _ => false,
        }
    }
}

/// Tick loop: announce the tick, run one pass, then wait `interval` measured
/// from the end of the pass.
async fn run_monitor(
    session: SessionHandle,
    generation: u64,
    cancel: CancellationToken,
    interval: Duration,
    outbox: Outbox,
) {
    let epoch = outbox.epoch();
    while !cancel.is_cancelled() {
        outbox.send(UiEvent::MonitorTick { epoch, generation });
        let outcome = refresh_pass(&session, &outbox).await;
        tracing::trace!(generation, ?outcome, "Monitor tick done");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    tracing::debug!(generation, "Monitor loop exited");
    outbox.send(UiEvent::MonitorStopped { epoch, generation });
}
