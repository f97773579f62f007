//! Engine façade
//!
//! [`LightEngine`] owns the render loop. The host talks to it through a
//! cloneable [`EngineHandle`]: telemetry and configuration are published into
//! snapshot cells, one-shot commands go through a bounded queue, and the loop
//! publishes a [`StatusReport`] after every cycle.

use std::{
    collections::BTreeSet,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use embassy_time::Instant;
use log::{debug, error, info, warn};
use serde::Serialize;
use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    channel::Channel,
    classifier::StateClassifier,
    config::{Config, ConfigError},
    dispatch::{
        BreakerPolicy, ChannelBatch, ChannelHealth, Dispatcher, FirmwareAdapter, GcodeQueue, PwmAdapter,
        SidecarAdapter,
    },
    event::OperatingEvent,
    group::ChannelKey,
    scheduler::{ChaseStatus, GroupStatus, RenderScheduler},
    shared::SnapshotCell,
    telemetry::TelemetrySnapshot,
};

const COMMAND_QUEUE_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Override the classified event until telemetry moves it on
    ForceEvent(OperatingEvent),
    /// Clear sticky overlays and restart the idle timer
    ResetClassifier,
}

/// Builds the adapters for a configuration
pub trait AdapterFactory: Send + Sync + 'static {
    fn build(&self, config: &Config) -> Dispatcher;
}

/// Sidecar over HTTP, firmware channels through a G-code queue
pub struct StandardAdapters {
    queue: Arc<dyn GcodeQueue>,
}

impl StandardAdapters {
    pub fn new(queue: Arc<dyn GcodeQueue>) -> Self {
        Self { queue }
    }
}

/// Breaker policy from the `[dispatch]` section
pub fn breaker_policy(config: &Config) -> BreakerPolicy {
    let dispatch = &config.dispatch;
    BreakerPolicy {
        failure_threshold: dispatch.failure_threshold,
        probe_first: embassy_time::Duration::from_millis(dispatch.probe_first_ms),
        probe_max: embassy_time::Duration::from_millis(dispatch.probe_max_ms),
        probe_factor: dispatch.probe_factor,
    }
}

impl AdapterFactory for StandardAdapters {
    fn build(&self, config: &Config) -> Dispatcher {
        let mut dispatcher = Dispatcher::new(
            breaker_policy(config),
            embassy_time::Duration::from_millis(config.dispatch.send_timeout_ms),
        );
        let firmware_timeout = embassy_time::Duration::from_millis(config.firmware.timeout_ms);
        let channels: BTreeSet<&ChannelKey> = config.groups.iter().map(|group| &group.channel).collect();

        for channel in channels {
            match channel {
                ChannelKey::Sidecar { gpio_pin } => {
                    match SidecarAdapter::new(&config.sidecar, *gpio_pin) {
                        Ok(adapter) => dispatcher.register(channel.clone(), Box::new(adapter)),
                        Err(err) => error!("[engine] {channel} adapter unavailable: {err}"),
                    }
                }
                ChannelKey::Firmware { neopixel } => dispatcher.register(
                    channel.clone(),
                    Box::new(FirmwareAdapter::new(
                        Arc::clone(&self.queue),
                        neopixel.clone(),
                        firmware_timeout,
                    )),
                ),
                ChannelKey::Binary { pin_name } => dispatcher.register(
                    channel.clone(),
                    Box::new(PwmAdapter::new(
                        Arc::clone(&self.queue),
                        pin_name.clone(),
                        firmware_timeout,
                    )),
                ),
            }
        }
        dispatcher
    }
}

/// Snapshot of engine state for the host's status surface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub event: Option<OperatingEvent>,
    pub previous_event: Option<OperatingEvent>,
    pub time_in_state_ms: u64,
    pub groups: Vec<GroupStatus>,
    pub channels: Vec<ChannelHealth>,
    pub chase: Vec<ChaseStatus>,
    pub fps: f32,
    pub config_generation: u64,
    pub config_error: Option<String>,
    pub running: bool,
}

struct Shared {
    telemetry: SnapshotCell<TelemetrySnapshot>,
    telemetry_seq: AtomicU64,
    config: SnapshotCell<Config>,
    generation: AtomicU64,
    config_error: SnapshotCell<Option<String>>,
    status: SnapshotCell<StatusReport>,
    commands: Channel<EngineCommand, COMMAND_QUEUE_SIZE>,
    wake: Notify,
    shutdown: CancellationToken,
}

/// Host-side handle to a running engine
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    /// Publish a new telemetry snapshot
    pub fn submit_telemetry(&self, telemetry: TelemetrySnapshot) {
        self.shared.telemetry.store(telemetry);
        self.shared.telemetry_seq.fetch_add(1, Ordering::AcqRel);
        self.shared.wake.notify_one();
    }

    /// Swap in an already validated configuration
    pub fn apply_config(&self, config: Config) {
        self.shared.config.store(config);
        self.shared.config_error.store(None);
        let generation = self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1;
        info!("[engine] configuration generation {generation} applied");
        self.shared.wake.notify_one();
    }

    /// Validate a TOML document and apply it.
    ///
    /// A rejected document leaves the running configuration in place and is
    /// reported through [`StatusReport::config_error`].
    pub fn apply_config_str(&self, source: &str) -> Result<(), ConfigError> {
        self.accept(Config::from_toml_str(source))
    }

    /// Load, validate and apply a configuration file
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.accept(Config::load(path))
    }

    fn accept(&self, result: Result<Config, ConfigError>) -> Result<(), ConfigError> {
        match result {
            Ok(config) => {
                self.apply_config(config);
                Ok(())
            }
            Err(err) => {
                error!("[engine] configuration rejected ({}): {}", err.as_label(), err);
                self.shared.config_error.store(Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Queue an event override; `false` if the command queue is full
    pub fn force_event(&self, event: OperatingEvent) -> bool {
        self.send(EngineCommand::ForceEvent(event))
    }

    pub fn reset_classifier(&self) -> bool {
        self.send(EngineCommand::ResetClassifier)
    }

    fn send(&self, command: EngineCommand) -> bool {
        if self.shared.commands.try_send(command).is_err() {
            warn!("[engine] command queue full, dropped {command:?}");
            return false;
        }
        self.shared.wake.notify_one();
        true
    }

    pub fn status(&self) -> StatusReport {
        let mut report = (*self.shared.status.load()).clone();
        report.config_error = (*self.shared.config_error.load()).clone();
        report.config_generation = self.shared.generation.load(Ordering::Acquire);
        report
    }

    /// Ask the loop to turn everything off and exit
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }
}

/// Send dark frames on every channel at once, bounded by `timeout`
async fn blank(dispatcher: &mut Dispatcher, batches: &[ChannelBatch], timeout: embassy_time::Duration) {
    let limit = std::time::Duration::from_micros(timeout.as_micros());
    match tokio::time::timeout(limit, dispatcher.dispatch_all(batches, Instant::now())).await {
        Ok(results) => {
            for (channel, result) in results {
                if let Err(err) = result {
                    warn!("[engine] {channel} not turned off: {err}");
                }
            }
        }
        Err(_) => warn!("[engine] all-off did not finish within {} ms", timeout.as_millis()),
    }
}

/// Everything the loop rebuilds on a configuration change
struct Pipeline {
    config: Arc<Config>,
    scheduler: RenderScheduler,
    dispatcher: Dispatcher,
}

pub struct LightEngine {
    shared: Arc<Shared>,
    factory: Arc<dyn AdapterFactory>,
}

impl LightEngine {
    pub fn new(config: Config, factory: impl AdapterFactory) -> Self {
        let shared = Arc::new(Shared {
            telemetry: SnapshotCell::default(),
            telemetry_seq: AtomicU64::new(0),
            config: SnapshotCell::new(config),
            generation: AtomicU64::new(1),
            config_error: SnapshotCell::new(None),
            status: SnapshotCell::default(),
            commands: Channel::new(),
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
        });
        Self {
            shared,
            factory: Arc::new(factory),
        }
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run the loop on the current tokio runtime
    pub fn spawn(self) -> (EngineHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    fn build(&self, generation: u64) -> Pipeline {
        let config = self.shared.config.load();
        info!(
            "[engine] building generation {generation}: {} groups, {} chase rings",
            config.groups.len(),
            config.rings.len()
        );
        Pipeline {
            scheduler: RenderScheduler::new(
                config.scheduler(),
                config.groups.clone(),
                config.rings.clone(),
            ),
            dispatcher: self.factory.build(&config),
            config,
        }
    }

    fn publish(&self, classifier: &StateClassifier, pipeline: &Pipeline, now: Instant, generation: u64) {
        self.shared.status.store(StatusReport {
            event: Some(classifier.current()),
            previous_event: classifier.previous(),
            time_in_state_ms: classifier.time_in_state(now).as_millis(),
            groups: pipeline.scheduler.status(),
            channels: pipeline.dispatcher.health(),
            chase: pipeline.scheduler.chase_status(),
            fps: pipeline.scheduler.fps(),
            config_generation: generation,
            config_error: None,
            running: true,
        });
    }

    /// Render until shutdown, then send one bounded all-off frame.
    pub async fn run(self) {
        let shared = Arc::clone(&self.shared);
        let mut generation = shared.generation.load(Ordering::Acquire);
        let mut pipeline = self.build(generation);
        let mut classifier = StateClassifier::new(pipeline.config.classifier(), Instant::now());
        let mut seen_telemetry = 0;
        // A forced event holds until the next telemetry snapshot
        let mut forced = false;

        info!("[engine] render loop started");
        loop {
            let now = Instant::now();

            let latest = shared.generation.load(Ordering::Acquire);
            if latest != generation {
                generation = latest;
                let next = self.build(generation);
                let retired = pipeline.scheduler.off_batches(|group| {
                    !next.scheduler.groups().iter().any(|kept| kept.same_footprint(group))
                });
                if !retired.is_empty() {
                    info!("[engine] turning off {} retired channel batches", retired.len());
                    let timeout = pipeline.config.shutdown_timeout();
                    blank(&mut pipeline.dispatcher, &retired, timeout).await;
                }
                pipeline = next;
                classifier.set_config(pipeline.config.classifier());
            }

            for (channel, result) in pipeline.dispatcher.collect(now).await {
                if let Err(err) = result {
                    debug!("[engine] {channel} not updated: {err}");
                }
            }

            for command in shared.commands.drain() {
                match command {
                    EngineCommand::ForceEvent(event) => {
                        classifier.force(event, now);
                        forced = true;
                    }
                    EngineCommand::ResetClassifier => {
                        info!("[engine] classifier reset");
                        classifier.reset(now);
                    }
                }
            }

            let telemetry = shared.telemetry.load();
            let sequence = shared.telemetry_seq.load(Ordering::Acquire);
            let event = if sequence != seen_telemetry {
                seen_telemetry = sequence;
                forced = false;
                classifier.update((*telemetry).clone(), now)
            } else if forced {
                classifier.current()
            } else {
                classifier.tick(now)
            };

            let dispatcher = &pipeline.dispatcher;
            let cycle = pipeline.scheduler.cycle(now, &telemetry, event, &|channel| {
                dispatcher.is_ready(channel, now)
            });
            for batch in &cycle.batches {
                if let Err(err) = pipeline.dispatcher.start(batch, now) {
                    debug!("[engine] {} not started: {}", batch.channel, err);
                }
            }
            self.publish(&classifier, &pipeline, now, generation);

            let sleep = std::time::Duration::from_micros(cycle.sleep.as_micros());
            tokio::select! {
                () = shared.shutdown.cancelled() => break,
                () = shared.wake.notified() => {}
                () = tokio::time::sleep(sleep) => {}
            }
        }

        let timeout = pipeline.config.shutdown_timeout();
        let batches = pipeline.scheduler.all_off();
        blank(&mut pipeline.dispatcher, &batches, timeout).await;

        shared.status.update(|report| StatusReport {
            running: false,
            ..report.clone()
        });
        info!("[engine] render loop stopped");
    }
}
