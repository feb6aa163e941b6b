//! Simulated CAEN desktop high-voltage supply.
//!
//! Behaves like a small multi-channel HV supply:
//! - VSET/ISET/RUP/RDW/MAXV per channel, currents in microamps on the wire
//! - output stage with time-based ramping at RUP (up) and RDW (down)
//! - resistive load per channel; IMON = VMON / load
//! - overcurrent trip: when IMON exceeds ISET the channel latches the
//!   overcurrent flag and switches off; switching it on again clears the latch
//!
//! In [`MockMode::Instant`] voltages jump straight to their target and there
//! is no noise. In [`MockMode::Realistic`] every call pays the transport delay
//! from [`TimingConfig`] and readings carry a little noise.
//!
//! Clones share the simulated hardware, the journal and the error state, which
//! is how a test keeps a probe on a supply it handed to a factory.
//!
//! # Example
//!
//! ```rust,ignore
//! use hv_driver_mock::{MockHvSupply, MockMode};
//!
//! let supply = MockHvSupply::builder()
//!     .channels(4)
//!     .mode(MockMode::Realistic)
//!     .load_megaohm(200.0)
//!     .build();
//! let probe = supply.clone();
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use hv_core::{
    ChannelStatus, ConnectionTarget, DeviceIdentity, DriverError, DriverErrorKind, HvSession,
    OutputState, Parameter, SessionFactory,
};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::time::Instant;

use crate::common::{CallJournal, ErrorConfig, MockCall, MockMode, MockRng, TimingConfig};

const DRIVER_TYPE: &str = "mock_hv";

/// Difference (V) below which a channel counts as settled.
const SETTLED_EPSILON: f64 = 0.05;

// =============================================================================
// Simulated channel
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct ChannelSim {
    vset: f64,
    iset_ua: f64,
    rup: f64,
    rdw: f64,
    maxv: f64,
    output: OutputState,
    overcurrent: bool,
    /// Voltage at the start of the current ramp segment
    ramp_from: f64,
    ramp_start: Instant,
}

impl ChannelSim {
    fn new(now: Instant, maxv: f64) -> Self {
        Self {
            vset: 0.0,
            iset_ua: 100.0,
            rup: 50.0,
            rdw: 50.0,
            maxv,
            output: OutputState::Off,
            overcurrent: false,
            ramp_from: 0.0,
            ramp_start: now,
        }
    }

    fn target(&self) -> f64 {
        match self.output {
            OutputState::On => self.vset,
            OutputState::Off => 0.0,
        }
    }

    fn voltage_at(&self, now: Instant, instant: bool) -> f64 {
        let target = self.target();
        if instant {
            return target;
        }
        let elapsed = now.saturating_duration_since(self.ramp_start).as_secs_f64();
        if target >= self.ramp_from {
            (self.ramp_from + self.rup.max(0.0) * elapsed).min(target)
        } else {
            (self.ramp_from - self.rdw.max(0.0) * elapsed).max(target)
        }
    }

    /// Start a new ramp segment from wherever the output is now.
    /// Call before changing anything that moves the target.
    fn retarget(&mut self, now: Instant, instant: bool) {
        self.ramp_from = self.voltage_at(now, instant);
        self.ramp_start = now;
    }

    fn check_trip(&mut self, now: Instant, instant: bool, load_megaohm: f64) {
        if self.output != OutputState::On {
            return;
        }
        let imon_ua = self.voltage_at(now, instant) / load_megaohm;
        if imon_ua > self.iset_ua {
            self.retarget(now, instant);
            self.output = OutputState::Off;
            self.overcurrent = true;
        }
    }

    fn status(&self, now: Instant, instant: bool) -> ChannelStatus {
        let voltage = self.voltage_at(now, instant);
        let target = self.target();
        ChannelStatus {
            output: self.output,
            ramping_up: voltage < target - SETTLED_EPSILON,
            ramping_down: voltage > target + SETTLED_EPSILON,
            overcurrent: self.overcurrent,
        }
    }
}

// =============================================================================
// MockHvSupply
// =============================================================================

/// Simulated supply implementing [`HvSession`].
#[derive(Clone)]
pub struct MockHvSupply {
    model: Arc<str>,
    channels: Arc<Mutex<Vec<ChannelSim>>>,
    mode: MockMode,
    timing: TimingConfig,
    latency: Arc<HashMap<&'static str, Duration>>,
    load_megaohm: f64,
    noise_volts: f64,
    blocking_ramp: bool,
    rng: Arc<MockRng>,
    error_config: ErrorConfig,
    journal: CallJournal,
    closed: bool,
}

impl std::fmt::Debug for MockHvSupply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHvSupply")
            .field("model", &self.model)
            .field("channels", &self.channel_count())
            .field("mode", &self.mode)
            .finish()
    }
}

impl MockHvSupply {
    /// Four-channel supply in instant mode.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> MockHvSupplyBuilder {
        MockHvSupplyBuilder::default()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Calls recorded so far (shared by all clones).
    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    pub fn error_config(&self) -> &ErrorConfig {
        &self.error_config
    }

    /// Raw device value of a parameter, bypassing delays, errors and the journal.
    pub fn peek(&self, parameter: Parameter, channel: usize) -> Option<f64> {
        let now = Instant::now();
        let channels = self.channels.lock();
        let sim = channels.get(channel)?;
        Some(self.read_value(sim, parameter, now, false))
    }

    /// Status block, bypassing delays, errors and the journal.
    pub fn peek_status(&self, channel: usize) -> Option<ChannelStatus> {
        let now = Instant::now();
        let channels = self.channels.lock();
        channels
            .get(channel)
            .map(|sim| sim.status(now, self.is_instant()))
    }

    fn is_instant(&self) -> bool {
        self.mode == MockMode::Instant
    }

    fn read_value(&self, sim: &ChannelSim, parameter: Parameter, now: Instant, noisy: bool) -> f64 {
        let instant = self.is_instant();
        let noise = |amplitude: f64| {
            if noisy && !instant {
                self.rng.noise(amplitude)
            } else {
                0.0
            }
        };
        match parameter {
            Parameter::Vset => sim.vset,
            Parameter::Vmon => (sim.voltage_at(now, instant) + noise(self.noise_volts)).max(0.0),
            Parameter::Iset => sim.iset_ua,
            Parameter::Imon => {
                let volts = sim.voltage_at(now, instant);
                (volts / self.load_megaohm + noise(self.noise_volts / self.load_megaohm)).max(0.0)
            }
            Parameter::Rup => sim.rup,
            Parameter::Rdw => sim.rdw,
            Parameter::Maxv => sim.maxv,
        }
    }

    async fn delay(&self, operation: &'static str, write: bool) {
        let mut total = self.latency.get(operation).copied().unwrap_or_default();
        if self.mode == MockMode::Realistic {
            total += if write {
                self.timing.write_delay()
            } else {
                self.timing.read_delay()
            };
        }
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
    }

    fn check(&self, operation: &'static str, channel: Option<usize>) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::new(
                DRIVER_TYPE,
                DriverErrorKind::Connection,
                "Session closed",
            ));
        }
        self.error_config
            .check_operation(DRIVER_TYPE, operation, channel)?;
        if let Some(channel) = channel {
            let count = self.channel_count();
            if channel >= count {
                return Err(DriverError::new(
                    DRIVER_TYPE,
                    DriverErrorKind::InvalidParameter,
                    format!("Channel {} out of range (0..{})", channel, count),
                ));
            }
        }
        Ok(())
    }

    fn invalid(message: String) -> DriverError {
        DriverError::new(DRIVER_TYPE, DriverErrorKind::InvalidParameter, message)
    }

    fn finish<T>(&self, mut call: MockCall, result: &Result<T, DriverError>) {
        call.finished = Instant::now();
        call.succeeded = result.is_ok();
        self.journal.record(call);
    }

    /// Apply a write to the simulated channel. `value` is in device units.
    fn write_value(
        &self,
        channel: usize,
        parameter: Parameter,
        value: f64,
    ) -> Result<(), DriverError> {
        let now = Instant::now();
        let instant = self.is_instant();
        let mut channels = self.channels.lock();
        let sim = channels.get_mut(channel).ok_or_else(|| {
            Self::invalid(format!("Channel {} out of range", channel))
        })?;

        if value < 0.0 || !value.is_finite() {
            return Err(Self::invalid(format!("{} = {} rejected", parameter, value)));
        }

        match parameter {
            Parameter::Vset => {
                if value > sim.maxv {
                    return Err(Self::invalid(format!(
                        "VSET {} exceeds MAXV {}",
                        value, sim.maxv
                    )));
                }
                sim.retarget(now, instant);
                sim.vset = value;
            }
            Parameter::Iset => sim.iset_ua = value,
            Parameter::Rup => {
                sim.retarget(now, instant);
                sim.rup = value;
            }
            Parameter::Rdw => {
                sim.retarget(now, instant);
                sim.rdw = value;
            }
            Parameter::Maxv => {
                sim.maxv = value;
                if sim.vset > value {
                    sim.retarget(now, instant);
                    sim.vset = value;
                }
            }
            Parameter::Vmon | Parameter::Imon => {
                return Err(Self::invalid(format!("{} is read-only", parameter)));
            }
        }
        sim.check_trip(now, instant, self.load_megaohm);
        Ok(())
    }
}

impl Default for MockHvSupply {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HvSession for MockHvSupply {
    async fn identify(&mut self) -> Result<DeviceIdentity, DriverError> {
        let call = MockCall::new("identify", None, Instant::now());
        self.delay("identify", false).await;
        let result = self.check("identify", None).map(|_| DeviceIdentity {
            model: self.model.to_string(),
            channel_count: self.channel_count(),
        });
        self.finish(call, &result);
        result
    }

    async fn get(&mut self, parameter: Parameter, channel: usize) -> Result<f64, DriverError> {
        let mut call = MockCall::new("get", Some(channel), Instant::now());
        call.parameter = Some(parameter);
        self.delay("get", false).await;

        let result = self.check("get", Some(channel)).and_then(|_| {
            let now = Instant::now();
            let mut channels = self.channels.lock();
            let sim = channels
                .get_mut(channel)
                .ok_or_else(|| Self::invalid(format!("Channel {} out of range", channel)))?;
            sim.check_trip(now, self.is_instant(), self.load_megaohm);
            Ok(self.read_value(sim, parameter, now, true))
        });

        self.finish(call, &result);
        result
    }

    async fn set(
        &mut self,
        parameter: Parameter,
        channel: usize,
        value: f64,
    ) -> Result<(), DriverError> {
        let mut call = MockCall::new("set", Some(channel), Instant::now());
        call.parameter = Some(parameter);
        call.value = Some(value);
        self.delay("set", true).await;

        let result = self
            .check("set", Some(channel))
            .and_then(|_| self.write_value(channel, parameter, value));

        self.finish(call, &result);
        result
    }

    async fn status(&mut self, channel: usize) -> Result<ChannelStatus, DriverError> {
        let call = MockCall::new("status", Some(channel), Instant::now());
        self.delay("status", false).await;

        let result = self.check("status", Some(channel)).and_then(|_| {
            let now = Instant::now();
            let instant = self.is_instant();
            let mut channels = self.channels.lock();
            let sim = channels
                .get_mut(channel)
                .ok_or_else(|| Self::invalid(format!("Channel {} out of range", channel)))?;
            sim.check_trip(now, instant, self.load_megaohm);
            Ok(sim.status(now, instant))
        });

        self.finish(call, &result);
        result
    }

    async fn set_output(&mut self, channel: usize, state: OutputState) -> Result<(), DriverError> {
        let mut call = MockCall::new("output", Some(channel), Instant::now());
        call.output = Some(state);
        self.delay("output", true).await;

        let result = self.check("output", Some(channel)).and_then(|_| {
            let now = Instant::now();
            let instant = self.is_instant();
            let mut channels = self.channels.lock();
            let sim = channels
                .get_mut(channel)
                .ok_or_else(|| Self::invalid(format!("Channel {} out of range", channel)))?;
            sim.retarget(now, instant);
            sim.output = state;
            if state == OutputState::On {
                sim.overcurrent = false;
            }
            sim.check_trip(now, instant, self.load_megaohm);
            Ok(())
        });

        self.finish(call, &result);
        result
    }

    async fn ramp(
        &mut self,
        channel: usize,
        target_volts: f64,
        rate: f64,
    ) -> Result<(), DriverError> {
        let mut call = MockCall::new("ramp", Some(channel), Instant::now());
        call.value = Some(target_volts);
        self.delay("ramp", true).await;

        let result = self.check("ramp", Some(channel)).and_then(|_| {
            if rate <= 0.0 || !rate.is_finite() {
                return Err(Self::invalid(format!("Ramp rate {} rejected", rate)));
            }
            let now = Instant::now();
            let instant = self.is_instant();
            let mut channels = self.channels.lock();
            let sim = channels
                .get_mut(channel)
                .ok_or_else(|| Self::invalid(format!("Channel {} out of range", channel)))?;
            if !(0.0..=sim.maxv).contains(&target_volts) {
                return Err(Self::invalid(format!(
                    "Ramp target {} outside 0..{}",
                    target_volts, sim.maxv
                )));
            }

            let current = sim.voltage_at(now, instant);
            sim.retarget(now, instant);
            if target_volts >= current {
                sim.rup = rate;
            } else {
                sim.rdw = rate;
            }
            sim.vset = target_volts;

            // Remaining ramp time, for blocking ramps
            let remaining = if sim.output == OutputState::On && !instant {
                Duration::from_secs_f64((target_volts - current).abs() / rate)
            } else {
                Duration::ZERO
            };
            Ok(remaining)
        });

        let result = match result {
            Ok(remaining) => {
                if self.blocking_ramp && !remaining.is_zero() {
                    tokio::time::sleep(remaining).await;
                }
                Ok(())
            }
            Err(e) => Err(e),
        };

        self.finish(call, &result);
        result
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        let call = MockCall::new("close", None, Instant::now());
        self.closed = true;
        let result = Ok(());
        self.finish(call, &result);
        result
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for [`MockHvSupply`]
#[derive(Debug, Clone)]
pub struct MockHvSupplyBuilder {
    model: String,
    channels: usize,
    max_volts: f64,
    mode: MockMode,
    timing: TimingConfig,
    latency: HashMap<&'static str, Duration>,
    load_megaohm: f64,
    noise_volts: f64,
    blocking_ramp: bool,
    error_config: ErrorConfig,
    rng_seed: Option<u64>,
    presets: Vec<(usize, Parameter, f64)>,
}

impl Default for MockHvSupplyBuilder {
    fn default() -> Self {
        Self {
            model: "DT1471ET".to_string(),
            channels: 4,
            max_volts: 5000.0,
            mode: MockMode::default(),
            timing: TimingConfig::default(),
            latency: HashMap::new(),
            load_megaohm: 100.0,
            noise_volts: 0.2,
            blocking_ramp: false,
            error_config: ErrorConfig::default(),
            rng_seed: None,
            presets: Vec::new(),
        }
    }
}

impl MockHvSupplyBuilder {
    /// Identification string returned by `identify`
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Initial MAXV of every channel
    pub fn max_volts(mut self, volts: f64) -> Self {
        self.max_volts = volts;
        self
    }

    pub fn mode(mut self, mode: MockMode) -> Self {
        self.mode = mode;
        self
    }

    /// Transport delays used in realistic mode
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Extra delay for one operation, applied in every mode.
    ///
    /// Operation names match [`MockCall::operation`].
    pub fn latency(mut self, operation: &'static str, delay: Duration) -> Self {
        self.latency.insert(operation, delay);
        self
    }

    /// Load resistance on every channel (MΩ); 1 V across 1 MΩ reads 1 µA
    pub fn load_megaohm(mut self, load: f64) -> Self {
        self.load_megaohm = load.max(f64::MIN_POSITIVE);
        self
    }

    /// Peak noise on VMON in realistic mode (V)
    pub fn noise_volts(mut self, noise: f64) -> Self {
        self.noise_volts = noise;
        self
    }

    /// Make `ramp` block until the output reaches the target
    pub fn blocking_ramp(mut self, blocking: bool) -> Self {
        self.blocking_ramp = blocking;
        self
    }

    pub fn error_config(mut self, config: ErrorConfig) -> Self {
        self.error_config = config;
        self
    }

    /// Set RNG seed for deterministic behavior
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Initial value of a parameter, in device units
    pub fn preset(mut self, channel: usize, parameter: Parameter, value: f64) -> Self {
        self.presets.push((channel, parameter, value));
        self
    }

    pub fn build(self) -> MockHvSupply {
        let now = Instant::now();
        let mut channels: Vec<ChannelSim> = (0..self.channels)
            .map(|_| ChannelSim::new(now, self.max_volts))
            .collect();

        for (channel, parameter, value) in self.presets {
            if let Some(sim) = channels.get_mut(channel) {
                match parameter {
                    Parameter::Vset => {
                        sim.vset = value;
                    }
                    Parameter::Iset => sim.iset_ua = value,
                    Parameter::Rup => sim.rup = value,
                    Parameter::Rdw => sim.rdw = value,
                    Parameter::Maxv => sim.maxv = value,
                    Parameter::Vmon | Parameter::Imon => {
                        tracing::warn!("Ignoring preset for read-only {}", parameter);
                    }
                }
            }
        }

        MockHvSupply {
            model: Arc::from(self.model),
            channels: Arc::new(Mutex::new(channels)),
            mode: self.mode,
            timing: self.timing,
            latency: Arc::new(self.latency),
            load_megaohm: self.load_megaohm,
            noise_volts: self.noise_volts,
            blocking_ramp: self.blocking_ramp,
            rng: Arc::new(MockRng::new(self.rng_seed)),
            error_config: self.error_config,
            journal: CallJournal::new(),
            closed: false,
        }
    }
}

// =============================================================================
// MockHvFactory - SessionFactory implementation
// =============================================================================

/// Configuration for the simulated supply, as read from the settings file.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
#[serde(default)]
pub struct MockHvConfig {
    /// Model string returned by identify
    pub model: String,
    pub channels: usize,
    pub mode: MockMode,
    /// Resistive load on every channel (MOhm)
    pub load_megaohm: f64,
    /// RNG seed for noise; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for MockHvConfig {
    fn default() -> Self {
        Self {
            model: "DT1471ET".to_string(),
            channels: 4,
            mode: MockMode::Instant,
            load_megaohm: 100.0,
            seed: None,
        }
    }
}

/// Opens sessions onto one shared simulated supply.
///
/// Every `open` hands out a clone of the same supply, so state survives a
/// disconnect/reconnect cycle like real hardware does.
#[derive(Debug, Clone)]
pub struct MockHvFactory {
    supply: MockHvSupply,
}

impl MockHvFactory {
    pub fn new(supply: MockHvSupply) -> Self {
        Self { supply }
    }

    pub fn from_config(config: &MockHvConfig) -> Self {
        let mut builder = MockHvSupply::builder()
            .model(config.model.clone())
            .channels(config.channels)
            .mode(config.mode)
            .load_megaohm(config.load_megaohm);
        if config.mode == MockMode::Realistic {
            builder = builder.timing(TimingConfig::usb());
        }
        if let Some(seed) = config.seed {
            builder = builder.rng_seed(seed);
        }
        Self::new(builder.build())
    }

    /// The supply every session opened by this factory talks to.
    pub fn supply(&self) -> &MockHvSupply {
        &self.supply
    }
}

impl SessionFactory for MockHvFactory {
    fn driver_type(&self) -> &'static str {
        DRIVER_TYPE
    }

    fn open(
        &self,
        target: ConnectionTarget,
    ) -> BoxFuture<'static, Result<Box<dyn HvSession>, DriverError>> {
        let supply = self.supply.clone();
        Box::pin(async move {
            let call = MockCall::new("connect", None, Instant::now());
            supply.delay("connect", false).await;

            let result = if target.address.trim().is_empty() {
                Err(DriverError::new(
                    DRIVER_TYPE,
                    DriverErrorKind::Connection,
                    "No port or IP address given",
                ))
            } else {
                supply
                    .error_config
                    .check_operation(DRIVER_TYPE, "connect", None)
            };
            supply.finish(call, &result);
            result?;

            tracing::debug!(address = %target.address, "Opened simulated HV supply");
            Ok::<_, DriverError>(Box::new(supply) as Box<dyn HvSession>)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorScenario;

    #[tokio::test]
    async fn test_identify() {
        let mut supply = MockHvSupply::builder().channels(2).model("DT1470ET").build();
        let id = supply.identify().await.unwrap();
        assert_eq!(id.model, "DT1470ET");
        assert_eq!(id.channel_count, 2);
    }

    #[tokio::test]
    async fn test_currents_are_in_microamps() {
        let mut supply = MockHvSupply::new();
        supply.set(Parameter::Iset, 0, 5.0).await.unwrap();
        assert_eq!(supply.get(Parameter::Iset, 0).await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_instant_mode_output_follows_vset() {
        let mut supply = MockHvSupply::new();
        supply.set(Parameter::Vset, 1, 1000.0).await.unwrap();
        assert_eq!(supply.get(Parameter::Vmon, 1).await.unwrap(), 0.0);

        supply.set_output(1, OutputState::On).await.unwrap();
        assert_eq!(supply.get(Parameter::Vmon, 1).await.unwrap(), 1000.0);
        // 1000 V across 100 MOhm = 10 uA
        assert!((supply.get(Parameter::Imon, 1).await.unwrap() - 10.0).abs() < 1e-9);

        let status = supply.status(1).await.unwrap();
        assert_eq!(status.output, OutputState::On);
        assert!(!status.ramping_up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_realistic_ramp_uses_rup_and_rdw() {
        let mut supply = MockHvSupply::builder()
            .mode(MockMode::Realistic)
            .noise_volts(0.0)
            .build();
        supply.set(Parameter::Rup, 0, 100.0).await.unwrap();
        supply.set(Parameter::Vset, 0, 500.0).await.unwrap();
        supply.set_output(0, OutputState::On).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let vmon = supply.get(Parameter::Vmon, 0).await.unwrap();
        assert!((vmon - 200.0).abs() < 1.0, "expected ~200 V, got {}", vmon);
        assert!(supply.status(0).await.unwrap().ramping_up);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(supply.get(Parameter::Vmon, 0).await.unwrap(), 500.0);
        assert!(!supply.status(0).await.unwrap().ramping_up);

        supply.set(Parameter::Rdw, 0, 250.0).await.unwrap();
        supply.set_output(0, OutputState::Off).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(supply.status(0).await.unwrap().ramping_down);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(supply.get(Parameter::Vmon, 0).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_overcurrent_trips_channel() {
        let mut supply = MockHvSupply::builder().load_megaohm(10.0).build();
        // 1000 V / 10 MOhm = 100 uA > 50 uA limit
        supply.set(Parameter::Iset, 0, 50.0).await.unwrap();
        supply.set(Parameter::Vset, 0, 1000.0).await.unwrap();
        supply.set_output(0, OutputState::On).await.unwrap();

        let status = supply.status(0).await.unwrap();
        assert!(status.overcurrent);
        assert_eq!(status.output, OutputState::Off);

        supply.set(Parameter::Vset, 0, 100.0).await.unwrap();
        supply.set_output(0, OutputState::On).await.unwrap();
        let status = supply.status(0).await.unwrap();
        assert!(!status.overcurrent);
        assert_eq!(status.output, OutputState::On);
    }

    #[tokio::test]
    async fn test_vset_above_maxv_rejected() {
        let mut supply = MockHvSupply::new();
        supply.set(Parameter::Maxv, 0, 2000.0).await.unwrap();
        let err = supply.set(Parameter::Vset, 0, 2500.0).await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::InvalidParameter);
        assert!(supply.set(Parameter::Vmon, 0, 1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_ramp_sets_target_and_rate() {
        let mut supply = MockHvSupply::new();
        supply.ramp(2, 1500.0, 25.0).await.unwrap();
        assert_eq!(supply.peek(Parameter::Vset, 2), Some(1500.0));
        assert_eq!(supply.peek(Parameter::Rup, 2), Some(25.0));
        assert!(supply.ramp(2, 1500.0, 0.0).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_ramp_waits_for_target() {
        let mut supply = MockHvSupply::builder()
            .mode(MockMode::Realistic)
            .blocking_ramp(true)
            .build();
        supply.set_output(0, OutputState::On).await.unwrap();

        let start = Instant::now();
        supply.ramp(0, 100.0, 50.0).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_channel_out_of_range() {
        let mut supply = MockHvSupply::builder().channels(2).build();
        let err = supply.get(Parameter::Vset, 2).await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::InvalidParameter);
    }

    #[tokio::test]
    async fn test_error_injection_per_channel() {
        let mut supply = MockHvSupply::builder()
            .error_config(ErrorConfig::scenario(ErrorScenario::ChannelFault {
                channel: 1,
            }))
            .build();
        assert!(supply.get(Parameter::Vset, 1).await.is_err());
        assert!(supply.get(Parameter::Vset, 0).await.is_ok());
    }

    #[tokio::test]
    async fn test_journal_records_calls() {
        let mut supply = MockHvSupply::new();
        let probe = supply.clone();
        supply.set(Parameter::Vset, 0, 10.0).await.unwrap();
        supply.get(Parameter::Vset, 0).await.unwrap();
        let _ = supply.get(Parameter::Vset, 9).await;

        let calls = probe.journal().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].operation, "set");
        assert_eq!(calls[0].value, Some(10.0));
        assert!(calls[1].succeeded);
        assert!(!calls[2].succeeded);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_calls() {
        let mut supply = MockHvSupply::new();
        supply.close().await.unwrap();
        let err = supply.get(Parameter::Vset, 0).await.unwrap_err();
        assert_eq!(err.kind, DriverErrorKind::Connection);
    }

    #[tokio::test]
    async fn test_factory_shares_state_across_sessions() {
        let factory = MockHvFactory::new(MockHvSupply::new());

        let mut first = factory.open(ConnectionTarget::default()).await.unwrap();
        first.set(Parameter::Vset, 3, 750.0).await.unwrap();
        first.close().await.unwrap();

        let mut second = factory.open(ConnectionTarget::default()).await.unwrap();
        assert_eq!(second.get(Parameter::Vset, 3).await.unwrap(), 750.0);
    }

    #[tokio::test]
    async fn test_factory_rejects_empty_address() {
        let factory = MockHvFactory::new(MockHvSupply::new());
        let target = ConnectionTarget {
            address: "  ".to_string(),
            ..Default::default()
        };
        let err = factory.open(target).await.err().unwrap();
        assert_eq!(err.kind, DriverErrorKind::Connection);
        assert_eq!(factory.supply().journal().count("connect"), 1);
    }

    #[test]
    fn test_factory_from_config() {
        let config = MockHvConfig {
            channels: 6,
            ..Default::default()
        };
        let factory = MockHvFactory::from_config(&config);
        assert_eq!(factory.supply().channel_count(), 6);
        assert_eq!(factory.driver_type(), "mock_hv");
    }
}
