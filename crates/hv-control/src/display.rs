//! Everything the panel shows, and the only place it changes.
//!
//! The coordinator applies [`UiEvent`](crate::events::UiEvent)s here on the UI
//! thread; widgets only read.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use hv_core::{format_amps, format_volts, ChannelIndicator, ChannelReading, DeviceIdentity};

use crate::log::{EventLog, LogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorStatus {
    Running,
    Stopped,
}

impl MonitorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            MonitorStatus::Running => "Running",
            MonitorStatus::Stopped => "Stopped",
        }
    }
}

/// One row of the channel table. `None` is a blank row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRow {
    pub channel: usize,
    pub reading: Option<ChannelReading>,
    pub updated: Option<DateTime<Local>>,
}

impl ChannelRow {
    fn new(channel: usize, reading: Option<ChannelReading>) -> Self {
        Self {
            channel,
            reading,
            updated: None,
        }
    }

    pub fn indicator(&self) -> ChannelIndicator {
        self.reading
            .map(|r| r.indicator())
            .unwrap_or(ChannelIndicator::Off)
    }

    pub fn vset_text(&self) -> String {
        self.reading.map(|r| format_volts(r.vset)).unwrap_or_default()
    }

    pub fn vmon_text(&self) -> String {
        self.reading.map(|r| format_volts(r.vmon)).unwrap_or_default()
    }

    pub fn iset_text(&self) -> String {
        self.reading.map(|r| format_amps(r.iset)).unwrap_or_default()
    }

    pub fn imon_text(&self) -> String {
        self.reading.map(|r| format_amps(r.imon)).unwrap_or_default()
    }
}

/// Modal error waiting to be acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNotice {
    pub title: String,
    pub message: String,
}

/// Everything the window shows, mutated only by the coordinator.
#[derive(Debug)]
pub struct DisplayState {
    pub connection: ConnectionStatus,
    /// `"<model> (<n> channels)"` or `"Not connected"`
    pub device_info: String,
    /// Label of the monitoring indicator
    pub monitor: MonitorStatus,
    pub log: EventLog,
    rows: Vec<ChannelRow>,
    errors: VecDeque<ErrorNotice>,
    last_refresh: Option<DateTime<Local>>,
}

impl DisplayState {
    pub fn new(max_log_lines: usize) -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            device_info: "Not connected".to_string(),
            monitor: MonitorStatus::Stopped,
            log: EventLog::new(max_log_lines),
            rows: Vec::new(),
            errors: VecDeque::new(),
            last_refresh: None,
        }
    }

    pub fn rows(&self) -> &[ChannelRow] {
        &self.rows
    }

    pub fn row(&self, channel: usize) -> Option<&ChannelRow> {
        self.rows.get(channel)
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn log(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    pub(crate) fn connecting(&mut self) {
        self.connection = ConnectionStatus::Connecting;
    }

    /// Build a fresh table for the device: every row zeroed and `OFF`.
    pub(crate) fn connected(&mut self, identity: &DeviceIdentity) {
        self.connection = ConnectionStatus::Connected;
        self.device_info = identity.to_string();
        self.rows = (0..identity.channel_count)
            .map(|ch| ChannelRow::new(ch, Some(ChannelReading::zeroed(ch))))
            .collect();
        self.last_refresh = None;
    }

    /// Blank every row, keeping the table size so the layout doesn't jump.
    pub(crate) fn disconnected(&mut self) {
        self.connection = ConnectionStatus::Disconnected;
        self.device_info = "Not connected".to_string();
        self.monitor = MonitorStatus::Stopped;
        for row in &mut self.rows {
            row.reading = None;
            row.updated = None;
        }
    }

    /// Replace a channel's row with a new reading. Unknown channels are ignored.
    pub(crate) fn apply_reading(&mut self, reading: ChannelReading) {
        if let Some(row) = self.rows.get_mut(reading.channel) {
            row.reading = Some(reading);
            row.updated = Some(Local::now());
        }
    }

    /// Show a channel whose read failed as zeroed and off.
    pub(crate) fn zero_channel(&mut self, channel: usize) {
        self.apply_reading(ChannelReading::zeroed(channel));
    }

    pub(crate) fn refresh_completed(&mut self) {
        self.last_refresh = Some(Local::now());
    }

    pub(crate) fn set_monitor(&mut self, status: MonitorStatus) {
        self.monitor = status;
    }

    pub fn notify_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        self.errors.push_back(ErrorNotice {
            title: title.into(),
            message: message.into(),
        });
    }

    /// Oldest unacknowledged error.
    pub fn current_error(&self) -> Option<&ErrorNotice> {
        self.errors.front()
    }

    pub fn dismiss_error(&mut self) {
        self.errors.pop_front();
    }

    pub fn pending_errors(&self) -> usize {
        self.errors.len()
    }
}
