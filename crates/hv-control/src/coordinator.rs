//! Poll-and-dispatch coordinator.
//!
//! Owns the connection, the monitor loop and the display state. All public
//! methods run on the UI thread and return immediately; device I/O happens on
//! tokio tasks that report back through [`UiEvent`]s, which
//! [`Coordinator::process_events`] applies.
//!
//! Every connect attempt gets a new epoch. Events carry the epoch of the
//! session they were produced for, and anything not matching the active
//! epoch is dropped, so results that straggle in after a disconnect never
//! reach the display.

use std::sync::Arc;

use hv_core::{
    Command, ConnectionTarget, HvError, HvResult, OutputState, Parameter,
    PendingCommand, SessionFactory, SessionHandle, ValidationError,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::ControlSettings;
use crate::dispatch::run_commands;
use crate::display::{ConnectionStatus, DisplayState, MonitorStatus};
use crate::events::{EventReceiver, EventSender, Outbox, UiEvent};
use crate::log::LogEntry;
use crate::monitor::{Monitor, MonitorState};
use crate::refresh::refresh_pass;

pub struct Coordinator {
    runtime: Handle,
    factory: Arc<dyn SessionFactory>,
    settings: ControlSettings,
    tx: EventSender,
    rx: EventReceiver,
    session: Option<SessionHandle>,
    /// Epoch of a connect attempt still in flight
    pending_connect: Option<u64>,
    last_epoch: u64,
    auto_refresh: bool,
    monitor: Monitor,
    display: DisplayState,
}

impl Coordinator {
    pub fn new(runtime: Handle, factory: Arc<dyn SessionFactory>, settings: ControlSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            factory,
            auto_refresh: settings.auto_refresh,
            monitor: Monitor::new(settings.poll_interval()),
            display: DisplayState::new(settings.max_log_lines),
            settings,
            tx,
            rx,
            session: None,
            pending_connect: None,
            last_epoch: 0,
        }
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.pending_connect.is_some()
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn monitor_state(&self) -> &MonitorState {
        self.monitor.state()
    }

    /// Epoch whose events are currently accepted.
    fn active_epoch(&self) -> Option<u64> {
        self.session
            .as_ref()
            .map(|s| s.epoch())
            .or(self.pending_connect)
    }

    fn log(&mut self, entry: LogEntry) {
        self.display.log(entry);
    }

    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect if disconnected, disconnect otherwise.
    pub fn toggle_connection(&mut self, target: ConnectionTarget) {
        if self.session.is_some() || self.pending_connect.is_some() {
            self.disconnect();
        } else {
            self.connect(target);
        }
    }

    /// Open a session in the background.
    pub fn connect(&mut self, target: ConnectionTarget) {
        if self.session.is_some() || self.pending_connect.is_some() {
            tracing::debug!("Connect ignored, already connected or connecting");
            return;
        }

        self.last_epoch += 1;
        let epoch = self.last_epoch;
        self.pending_connect = Some(epoch);
        self.display.connecting();
        self.log(LogEntry::info(format!("Connecting to {}", target)));

        let factory = Arc::clone(&self.factory);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let opened = async {
                let mut device = factory.open(target.clone()).await?;
                let identity = device.identify().await?;
                Ok::<_, HvError>(SessionHandle::new(device, identity, epoch))
            }
            .await;

            let event = match opened {
                Ok(session) => UiEvent::Connected { session, target },
                Err(error) => UiEvent::ConnectFailed {
                    epoch,
                    target,
                    error,
                },
            };
            let _ = tx.send(event);
        });
    }

    /// Report connection parameters that could not be turned into a target.
    pub fn reject_connect(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.display
            .notify_error("Connection Error", format!("Failed to connect:\n{}", message));
        self.log(LogEntry::error(format!("Connection failed: {}", message)));
    }

    /// Stop monitoring, cancel everything in flight and close the session.
    ///
    /// Returns immediately; the close runs in the background.
    pub fn disconnect(&mut self) {
        if let Some(session) = self.detach() {
            self.runtime.spawn(close_session(session));
        }
        if self.pending_connect.take().is_some() {
            self.display.connection = ConnectionStatus::Disconnected;
            self.log(LogEntry::info("Connection attempt abandoned"));
        }
    }

    /// Drop the active session from the display and monitor without closing it.
    fn detach(&mut self) -> Option<SessionHandle> {
        let session = self.session.take()?;
        self.monitor.reset();
        session.cancellation().cancel();
        self.display.disconnected();
        self.log(LogEntry::info("Disconnected"));
        Some(session)
    }

    /// Disconnect and wait for the session to close. Used on exit.
    pub async fn shutdown(&mut self) {
        self.pending_connect = None;
        if let Some(session) = self.detach() {
            close_session(session).await;
        }
    }

    // =========================================================================
    // Monitoring
    // =========================================================================

    /// Enable or disable automatic polling.
    ///
    /// Enabling without a session only records the choice; polling starts on
    /// the next successful connect.
    pub fn set_auto_refresh(&mut self, enabled: bool) {
        if self.auto_refresh == enabled {
            return;
        }
        self.auto_refresh = enabled;
        if enabled {
            self.log(LogEntry::info("Auto refresh enabled"));
            self.start_monitor();
        } else {
            self.log(LogEntry::info("Auto refresh disabled"));
            self.monitor.stop();
            self.display.set_monitor(MonitorStatus::Stopped);
        }
    }

    fn start_monitor(&mut self) {
        let Some(session) = self.session.clone() else {
            self.display.set_monitor(MonitorStatus::Stopped);
            return;
        };
        let outbox = Outbox::new(self.tx.clone(), session.epoch());
        self.monitor.start(&self.runtime, &session, outbox);
    }

    /// Run one refresh pass in the background.
    pub fn manual_refresh(&mut self) -> HvResult<()> {
        let session = self.require_session()?;
        let outbox = Outbox::new(self.tx.clone(), session.epoch());
        self.runtime.spawn(async move {
            refresh_pass(&session, &outbox).await;
        });
        Ok(())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Validate and send a parameter write typed by the user (SI units).
    pub fn submit_set(&mut self, channel: usize, parameter: Parameter, value_text: &str) -> HvResult<()> {
        let command = self
            .settings
            .limits
            .validate_set(channel, parameter, value_text);
        self.submit_validated(command)
    }

    /// Validate and send a voltage ramp typed by the user.
    pub fn submit_ramp(&mut self, channel: usize, target_text: &str, rate_text: &str) -> HvResult<()> {
        let command = self
            .settings
            .limits
            .validate_ramp(channel, target_text, rate_text);
        self.submit_validated(command)
    }

    pub fn switch_output(&mut self, channel: usize, state: OutputState) -> HvResult<()> {
        self.submit_validated(Ok(Command::Output { channel, state }))
    }

    /// Set VSET to a preset voltage.
    pub fn apply_voltage_preset(&mut self, channel: usize, volts: f64) -> HvResult<()> {
        self.submit_value(channel, Parameter::Vset, volts)
    }

    /// Set ISET to a preset current given in microamps.
    pub fn apply_current_preset(&mut self, channel: usize, microamps: f64) -> HvResult<()> {
        self.submit_value(channel, Parameter::Iset, microamps * 1e-6)
    }

    fn submit_value(&mut self, channel: usize, parameter: Parameter, value: f64) -> HvResult<()> {
        let command = self.settings.limits.check(parameter, value).map(|_| {
            Command::Set(PendingCommand {
                channel,
                parameter,
                value,
            })
        });
        self.submit_validated(command)
    }

    /// Switch every channel off, one command per channel, in channel order.
    ///
    /// Returns the number of off-commands issued. Each is reported on its own
    /// and a failure doesn't stop the rest.
    pub fn all_channels_off(&mut self) -> HvResult<usize> {
        let session = self.require_session()?;
        let commands: Vec<Command> = (0..session.channel_count())
            .map(|channel| Command::Output {
                channel,
                state: OutputState::Off,
            })
            .collect();
        let count = commands.len();
        self.log(LogEntry::info(format!("Turning off all {} channels", count)));
        self.spawn_commands(session, commands);
        Ok(count)
    }

    fn submit_validated(&mut self, command: Result<Command, ValidationError>) -> HvResult<()> {
        let session = self.require_session()?;
        let command = command
            .and_then(|c| session.check_channel(c.channel()).map(|_| c))
            .map_err(|e| self.reject(e))?;

        self.log(LogEntry::info(command.to_string()));
        self.spawn_commands(session, vec![command]);
        Ok(())
    }

    fn spawn_commands(&mut self, session: SessionHandle, commands: Vec<Command>) {
        let outbox = Outbox::new(self.tx.clone(), session.epoch());
        let delay = self.settings.post_command_delay();
        self.runtime
            .spawn(run_commands(session, commands, delay, outbox));
    }

    fn require_session(&mut self) -> HvResult<SessionHandle> {
        match &self.session {
            Some(session) => Ok(session.clone()),
            None => {
                let err = HvError::NotConnected;
                self.display.notify_error("Error", err.to_string());
                self.log(LogEntry::warn(err.to_string()));
                Err(err)
            }
        }
    }

    fn reject(&mut self, error: ValidationError) -> HvError {
        self.display.notify_error("Error", error.to_string());
        self.log(LogEntry::warn(format!("Rejected: {}", error)));
        HvError::Validation(error)
    }

    // =========================================================================
    // Presentation side
    // =========================================================================

    pub fn clear_log(&mut self) {
        self.display.log.clear();
    }

    pub fn dismiss_error(&mut self) {
        self.display.dismiss_error();
    }

    /// Apply every queued event. Returns how many were applied.
    pub fn process_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            if self.apply(event) {
                applied += 1;
            }
        }
        applied
    }

    fn apply(&mut self, event: UiEvent) -> bool {
        let event = match event {
            UiEvent::Connected { session, target } => return self.on_connected(session, target),
            other => other,
        };

        if Some(event.epoch()) != self.active_epoch() {
            tracing::trace!(epoch = event.epoch(), "Dropping stale event");
            return false;
        }

        match event {
            UiEvent::Connected { .. } => return false,
            UiEvent::ConnectFailed { target, error, .. } => {
                self.pending_connect = None;
                self.display.connection = ConnectionStatus::Disconnected;
                self.display
                    .notify_error("Connection Error", format!("Failed to connect:\n{}", error));
                self.log(LogEntry::error(format!(
                    "Connection to {} failed: {}",
                    target.address, error
                )));
            }
            UiEvent::Reading { reading, .. } => {
                self.log(LogEntry::info(format!(
                    "Updating CH{}: VSET={:.1}, VMON={:.1}, Status={}",
                    reading.channel,
                    reading.vset,
                    reading.vmon,
                    reading.indicator().label()
                )));
                self.display.apply_reading(reading);
            }
            UiEvent::ChannelFailed { channel, error, .. } => {
                self.log(LogEntry::warn(format!("Error reading CH{}: {}", channel, error)));
                self.display.zero_channel(channel);
            }
            UiEvent::RefreshCompleted { .. } => {
                self.display.refresh_completed();
                self.log(LogEntry::info("Refresh completed"));
            }
            UiEvent::MonitorTick { generation, .. } => {
                if !self.monitor.is_current(generation) {
                    return false;
                }
                self.display.set_monitor(MonitorStatus::Running);
            }
            UiEvent::MonitorStopped { generation, .. } => {
                if !self.monitor.on_stopped(generation) {
                    return false;
                }
                self.display.set_monitor(MonitorStatus::Stopped);
            }
            UiEvent::CommandCompleted { command, .. } => {
                self.log(LogEntry::info(command.success_message()));
            }
            UiEvent::CommandFailed { command, error, .. } => {
                self.log(LogEntry::error(format!(
                    "{}: {}",
                    command.failure_context(),
                    error
                )));
                self.display.notify_error("Error", error.to_string());
            }
            UiEvent::Log { entry, .. } => self.log(entry),
        }
        true
    }

    fn on_connected(&mut self, session: SessionHandle, target: ConnectionTarget) -> bool {
        if self.pending_connect != Some(session.epoch()) {
            tracing::debug!(
                epoch = session.epoch(),
                address = %target.address,
                "Closing session from abandoned connect"
            );
            self.runtime.spawn(close_session(session));
            return false;
        }

        self.pending_connect = None;
        self.display.connected(session.identity());
        self.log(LogEntry::info(format!(
            "Connected successfully! Device: {}",
            session.identity().model
        )));
        self.session = Some(session);

        if self.auto_refresh {
            self.start_monitor();
        }
        true
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("driver", &self.factory.driver_type())
            .field("session", &self.session)
            .field("pending_connect", &self.pending_connect)
            .field("auto_refresh", &self.auto_refresh)
            .field("monitor", self.monitor.state())
            .finish()
    }
}

async fn close_session(session: SessionHandle) {
    if let Err(e) = session.close().await {
        tracing::warn!(epoch = session.epoch(), "Error closing session: {}", e);
    }
}
