//! Record of calls made to the simulated supply.
//!
//! Tests use the journal to assert what the coordinator actually sent to the
//! device and in which order, including when each call started and finished.

use std::sync::Arc;

use hv_core::{OutputState, Parameter};
use parking_lot::Mutex;
use tokio::time::Instant;

/// One completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// `"identify"`, `"get"`, `"set"`, `"status"`, `"output"`, `"ramp"` or `"close"`
    pub operation: &'static str,
    pub channel: Option<usize>,
    pub parameter: Option<Parameter>,
    /// Device-unit value written, or the ramp target
    pub value: Option<f64>,
    pub output: Option<OutputState>,
    pub started: Instant,
    pub finished: Instant,
    pub succeeded: bool,
}

impl MockCall {
    pub(crate) fn new(operation: &'static str, channel: Option<usize>, started: Instant) -> Self {
        Self {
            operation,
            channel,
            parameter: None,
            value: None,
            output: None,
            started,
            finished: started,
            succeeded: false,
        }
    }
}

/// Shared, append-only call log.
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, call: MockCall) {
        self.calls.lock().push(call);
    }

    /// Copy of every call so far, in completion order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Calls with the given operation name.
    pub fn calls_of(&self, operation: &str) -> Vec<MockCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}
