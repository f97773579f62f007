//! Driver dispatch
//!
//! Staged group frames are grouped per physical channel into a
//! [`ChannelBatch`] and handed to that channel's [`ChannelAdapter`]. Every
//! adapter sits behind its own [`CircuitBreaker`], so a failing channel is
//! skipped without I/O while the rest keep updating, and every send runs on
//! its own task so a hung channel never holds up the others.

mod breaker;
mod firmware;
mod sidecar;

use std::collections::BTreeMap;

use async_trait::async_trait;
use embassy_time::{Duration, Instant};
use log::{error, info, warn};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

pub use breaker::{BreakerPolicy, BreakerState, CircuitBreaker};
pub use firmware::{FirmwareAdapter, GcodeQueue, PwmAdapter, pin_script, set_led_script};
pub use sidecar::{BatchRequest, LedUpdate, SidecarAdapter};

use crate::{color::Rgb, group::ChannelKey};

/// Failures are logged on the first occurrence and then every this many
const WARN_EVERY: u32 = 10;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("circuit open for {0}")]
    CircuitOpen(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("firmware rejected command: {0}")]
    Firmware(String),
    #[error("no adapter registered for {0}")]
    NoAdapter(String),
    #[error("send still in flight on {0}")]
    Busy(String),
}

impl DispatchError {
    pub const fn as_label(&self) -> &'static str {
        match self {
            Self::CircuitOpen(_) => "dispatch_circuit_open",
            Self::Timeout(_) => "dispatch_timeout",
            Self::Transport(_) => "dispatch_transport",
            Self::Status(_) => "dispatch_status",
            Self::Firmware(_) => "dispatch_firmware",
            Self::NoAdapter(_) => "dispatch_no_adapter",
            Self::Busy(_) => "dispatch_busy",
        }
    }
}

/// One group's frame, ready for the wire
#[derive(Debug, Clone, PartialEq)]
pub struct GroupUpdate {
    pub group: String,
    /// First pixel on the channel, 1-based
    pub index_start: usize,
    pub colors: Vec<Option<Rgb>>,
    /// Full-scale value for brightness pins
    pub scale: f32,
}

impl GroupUpdate {
    pub fn new(group: impl Into<String>, index_start: usize, colors: Vec<Option<Rgb>>) -> Self {
        Self {
            group: group.into(),
            index_start,
            colors,
            scale: 1.0,
        }
    }

    /// Last pixel on the channel, inclusive
    pub fn index_end(&self) -> usize {
        self.index_start + self.colors.len().saturating_sub(1)
    }

    /// The single color every pixel shares, if they all match
    pub fn uniform_color(&self) -> Option<Option<Rgb>> {
        let (first, rest) = self.colors.split_first()?;
        rest.iter().all(|color| color == first).then_some(*first)
    }
}

/// Every update bound for one physical channel in one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBatch {
    pub channel: ChannelKey,
    pub updates: Vec<GroupUpdate>,
}

/// Output adapter for one physical channel
#[async_trait]
pub trait ChannelAdapter: Send {
    /// Deliver every update in one go
    async fn send(&mut self, updates: &[GroupUpdate]) -> Result<(), DispatchError>;
}

/// Health report for one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelHealth {
    pub channel: String,
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub total_failures: u64,
    pub last_success_ms: Option<u64>,
    pub last_failure_ms: Option<u64>,
    pub last_error: Option<String>,
}

/// What a finished send hands back
type Completed = (Box<dyn ChannelAdapter>, Result<(), DispatchError>);

struct ChannelSlot {
    /// `None` while a send owns the adapter
    adapter: Option<Box<dyn ChannelAdapter>>,
    in_flight: Option<JoinHandle<Completed>>,
    breaker: CircuitBreaker,
}

impl ChannelSlot {
    fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.adapter.is_some()
    }

    /// Wait for the in-flight send, if any, and feed its outcome to the breaker
    async fn settle(&mut self, channel: &ChannelKey, now: Instant) -> Option<Result<(), DispatchError>> {
        let task = self.in_flight.take()?;
        let result = match task.await {
            Ok((adapter, result)) => {
                self.adapter = Some(adapter);
                result
            }
            Err(err) => {
                error!("[dispatch] {channel} send task lost its adapter: {err}");
                Err(DispatchError::Transport(err.to_string()))
            }
        };
        self.record(channel, now, &result);
        Some(result)
    }

    fn record(&mut self, channel: &ChannelKey, now: Instant, result: &Result<(), DispatchError>) {
        match result {
            Ok(()) => {
                if self.breaker.is_open() {
                    info!("[dispatch] {channel} recovered");
                }
                self.breaker.record_success(now);
            }
            Err(err) => {
                let opened = self.breaker.record_failure(now, err.to_string());
                let failures = self.breaker.consecutive_failures();
                if failures == 1 || failures % WARN_EVERY == 0 {
                    warn!(
                        "[dispatch] {channel} failed ({}, {failures} in a row): {err}",
                        err.as_label()
                    );
                }
                if opened {
                    warn!("[dispatch] {channel} circuit open");
                }
            }
        }
    }
}

/// Routes batches to adapters through their breakers.
///
/// Each send runs on its own task, so a slow channel is only ever late
/// itself. A channel with a send in flight is busy and takes no new batch
/// until [`Dispatcher::collect`] has picked up the outcome.
pub struct Dispatcher {
    channels: BTreeMap<ChannelKey, ChannelSlot>,
    policy: BreakerPolicy,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(policy: BreakerPolicy, send_timeout: Duration) -> Self {
        Self {
            channels: BTreeMap::new(),
            policy,
            send_timeout,
        }
    }

    pub fn register(&mut self, channel: ChannelKey, adapter: Box<dyn ChannelAdapter>) {
        self.channels.insert(
            channel,
            ChannelSlot {
                adapter: Some(adapter),
                in_flight: None,
                breaker: CircuitBreaker::new(self.policy),
            },
        );
    }

    pub fn has_channel(&self, channel: &ChannelKey) -> bool {
        self.channels.contains_key(channel)
    }

    /// Whether a send to `channel` would be started at `now`
    pub fn is_ready(&self, channel: &ChannelKey, now: Instant) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|slot| slot.is_idle() && slot.breaker.allow(now))
    }

    /// Whether `channel` has a send in flight
    pub fn is_busy(&self, channel: &ChannelKey) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|slot| slot.in_flight.is_some())
    }

    pub fn breaker(&self, channel: &ChannelKey) -> Option<&CircuitBreaker> {
        self.channels.get(channel).map(|slot| &slot.breaker)
    }

    /// Start sending one batch without waiting for it.
    ///
    /// Must be called from within a tokio runtime. The outcome reaches the
    /// breaker through [`Dispatcher::collect`].
    pub fn start(&mut self, batch: &ChannelBatch, now: Instant) -> Result<(), DispatchError> {
        let timeout = self.send_timeout;
        let Some(slot) = self.channels.get_mut(&batch.channel) else {
            return Err(DispatchError::NoAdapter(batch.channel.to_string()));
        };
        if slot.in_flight.is_some() {
            return Err(DispatchError::Busy(batch.channel.to_string()));
        }
        if !slot.breaker.allow(now) {
            return Err(DispatchError::CircuitOpen(batch.channel.to_string()));
        }
        let Some(mut adapter) = slot.adapter.take() else {
            return Err(DispatchError::NoAdapter(batch.channel.to_string()));
        };

        let updates = batch.updates.clone();
        let limit = std::time::Duration::from_micros(timeout.as_micros());
        slot.in_flight = Some(tokio::spawn(async move {
            let result = match tokio::time::timeout(limit, adapter.send(&updates)).await {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout(timeout.as_millis())),
            };
            (adapter, result)
        }));
        Ok(())
    }

    /// Pick up every send that has finished, without waiting on the rest
    pub async fn collect(&mut self, now: Instant) -> Vec<(ChannelKey, Result<(), DispatchError>)> {
        let mut results = Vec::new();
        for (channel, slot) in &mut self.channels {
            if slot.in_flight.as_ref().is_some_and(JoinHandle::is_finished) {
                if let Some(result) = slot.settle(channel, now).await {
                    results.push((channel.clone(), result));
                }
            }
        }
        results
    }

    /// Send one batch and wait for its outcome
    pub async fn dispatch(&mut self, batch: &ChannelBatch, now: Instant) -> Result<(), DispatchError> {
        match self.dispatch_all(std::slice::from_ref(batch), now).await.pop() {
            Some((_, result)) => result,
            None => Err(DispatchError::NoAdapter(batch.channel.to_string())),
        }
    }

    /// Send every batch concurrently and wait for all of them.
    ///
    /// Idle channels start first; a channel with a send already in flight
    /// waits that send out before taking its batch. Results come back in
    /// batch order.
    pub async fn dispatch_all(
        &mut self,
        batches: &[ChannelBatch],
        now: Instant,
    ) -> Vec<(ChannelKey, Result<(), DispatchError>)> {
        let mut started: Vec<Result<(), DispatchError>> =
            batches.iter().map(|batch| self.start(batch, now)).collect();
        for (batch, start) in batches.iter().zip(started.iter_mut()) {
            if matches!(start, Err(DispatchError::Busy(_))) {
                if let Some(slot) = self.channels.get_mut(&batch.channel) {
                    slot.settle(&batch.channel, now).await;
                }
                *start = self.start(batch, now);
            }
        }

        let mut results = Vec::with_capacity(batches.len());
        for (batch, start) in batches.iter().zip(started) {
            let result = match (start, self.channels.get_mut(&batch.channel)) {
                (Ok(()), Some(slot)) => slot
                    .settle(&batch.channel, now)
                    .await
                    .unwrap_or_else(|| Err(DispatchError::NoAdapter(batch.channel.to_string()))),
                (Ok(()), None) => Err(DispatchError::NoAdapter(batch.channel.to_string())),
                (Err(err), _) => Err(err),
            };
            results.push((batch.channel.clone(), result));
        }
        results
    }

    pub fn health(&self) -> Vec<ChannelHealth> {
        self.channels
            .iter()
            .map(|(channel, slot)| {
                let breaker = &slot.breaker;
                ChannelHealth {
                    channel: channel.to_string(),
                    state: breaker.state(),
                    consecutive_failures: breaker.consecutive_failures(),
                    total_requests: breaker.total_requests(),
                    total_failures: breaker.total_failures(),
                    last_success_ms: breaker.last_success().map(|at| at.as_millis()),
                    last_failure_ms: breaker.last_failure().map(|at| at.as_millis()),
                    last_error: breaker.last_error().map(str::to_owned),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::GroupUpdate;
    use crate::color::Rgb;

    #[test]
    fn test_uniform_color() {
        let red = Some(Rgb::new(255, 0, 0));
        let update = GroupUpdate::new("left", 4, vec![red, red, red]);
        assert_eq!(update.uniform_color(), Some(red));
        assert_eq!(update.index_end(), 6);

        let mixed = GroupUpdate::new("left", 1, vec![red, None]);
        assert_eq!(mixed.uniform_color(), None);

        let empty = GroupUpdate::new("left", 1, Vec::new());
        assert_eq!(empty.uniform_color(), None);
    }
}
