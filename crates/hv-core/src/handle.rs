//! Shared, cancellable access to a connected session.
//!
//! [`SessionHandle`] is what background tasks clone and hold. It owns:
//!
//! - the session itself behind a `tokio::sync::Mutex`, so refreshes and commands
//!   running on different tasks serialize at the session boundary;
//! - a `CancellationToken` tripped on disconnect. Anything waiting for the lock
//!   or for the device resolves to [`HvError::Cancelled`];
//! - a refresh gate, so two refresh passes never interleave their reads;
//! - the connection epoch, stamped on every result so the presentation layer
//!   can drop results that belong to an earlier connection.
//!
//! All values are in SI units here; [`Parameter`] does the conversion.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use crate::error::{HvError, HvResult, ValidationError};
use crate::parameter::Parameter;
use crate::reading::{ChannelReading, ChannelStatus, OutputState};
use crate::session::{DeviceIdentity, HvSession};

struct SessionInner {
    device: Mutex<Box<dyn HvSession>>,
    refresh_gate: Mutex<()>,
    identity: DeviceIdentity,
    epoch: u64,
    cancel: CancellationToken,
}

/// Cloneable handle to the active session.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("identity", &self.inner.identity)
            .field("epoch", &self.inner.epoch)
            .field("cancelled", &self.inner.cancel.is_cancelled())
            .finish()
    }
}

impl SessionHandle {
    pub fn new(device: Box<dyn HvSession>, identity: DeviceIdentity, epoch: u64) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                device: Mutex::new(device),
                refresh_gate: Mutex::new(()),
                identity,
                epoch,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.inner.identity
    }

    pub fn channel_count(&self) -> usize {
        self.inner.identity.channel_count
    }

    pub fn epoch(&self) -> u64 {
        self.inner.epoch
    }

    /// Token tripped when the session is closed.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Check a channel index against the connected channel count.
    pub fn check_channel(&self, channel: usize) -> Result<(), ValidationError> {
        let channel_count = self.channel_count();
        if channel < channel_count {
            Ok(())
        } else {
            Err(ValidationError::UnknownChannel {
                channel,
                channel_count,
            })
        }
    }

    /// Run `fut` unless the session is cancelled first.
    async fn guarded<T, F>(&self, fut: F) -> HvResult<T>
    where
        F: Future<Output = HvResult<T>>,
    {
        tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => Err(HvError::Cancelled),
            result = fut => result,
        }
    }

    async fn lock(&self) -> HvResult<MutexGuard<'_, Box<dyn HvSession>>> {
        self.guarded(async { Ok::<_, HvError>(self.inner.device.lock().await) })
            .await
    }

    /// Read a parameter, in SI units.
    pub async fn get(&self, parameter: Parameter, channel: usize) -> HvResult<f64> {
        let mut device = self.lock().await?;
        let raw = self
            .guarded(async { device.get(parameter, channel).await.map_err(HvError::from) })
            .await?;
        Ok(parameter.from_device(raw))
    }

    /// Write a parameter given in SI units.
    pub async fn set(&self, parameter: Parameter, channel: usize, value: f64) -> HvResult<()> {
        let raw = parameter.to_device(value);
        let mut device = self.lock().await?;
        self.guarded(async { device.set(parameter, channel, raw).await.map_err(HvError::from) })
            .await
    }

    pub async fn status(&self, channel: usize) -> HvResult<ChannelStatus> {
        let mut device = self.lock().await?;
        self.guarded(async { device.status(channel).await.map_err(HvError::from) })
            .await
    }

    pub async fn set_output(&self, channel: usize, state: OutputState) -> HvResult<()> {
        let mut device = self.lock().await?;
        self.guarded(async { device.set_output(channel, state).await.map_err(HvError::from) })
            .await
    }

    pub async fn ramp(&self, channel: usize, target_volts: f64, rate: f64) -> HvResult<()> {
        let mut device = self.lock().await?;
        self.guarded(async { device.ramp(channel, target_volts, rate).await.map_err(HvError::from) })
            .await
    }

    /// Read the four monitored parameters and the status block of a channel.
    ///
    /// Each call takes the session lock separately, so a command can slip in
    /// between two reads of the same channel.
    pub async fn read_channel(&self, channel: usize) -> HvResult<ChannelReading> {
        let vset = self.get(Parameter::Vset, channel).await?;
        let vmon = self.get(Parameter::Vmon, channel).await?;
        let iset = self.get(Parameter::Iset, channel).await?;
        let imon = self.get(Parameter::Imon, channel).await?;
        let status = self.status(channel).await?;

        Ok(ChannelReading {
            channel,
            vset,
            vmon,
            iset,
            imon,
            ..ChannelReading::zeroed(channel)
        }
        .with_status(status))
    }

    /// Hold the refresh gate for the duration of one refresh pass.
    pub async fn begin_refresh(&self) -> HvResult<MutexGuard<'_, ()>> {
        self.guarded(async { Ok::<_, HvError>(self.inner.refresh_gate.lock().await) })
            .await
    }

    /// Cancel everything in flight and close the device.
    ///
    /// The close itself is not cancellable: it waits for the lock, which
    /// in-flight calls release as soon as they observe the cancellation.
    pub async fn close(&self) -> HvResult<()> {
        tracing::debug!(epoch = self.inner.epoch, "Closing HV session");
        self.inner.cancel.cancel();
        let mut device = self.inner.device.lock().await;
        device.close().await?;
        Ok(())
    }
}
